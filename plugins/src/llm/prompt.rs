//! Prompt templates for the LLM-backed collaborators.

/// Tool set the task creator may assign.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolOffer {
    pub web_search: bool,
    pub user_input: bool,
    pub github: bool,
}

impl ToolOffer {
    fn listing(&self) -> String {
        let mut tools = vec!["[text-completion]"];
        if self.web_search {
            tools.push("[web-search]");
        }
        if self.user_input {
            tools.push("[user-input]");
        }
        if self.github {
            tools.push("[github-tool]");
        }
        tools.join(" ")
    }
}

const TASK_LIST_EXAMPLE: &str = r#"EXAMPLE OBJECTIVE=Look up AI news from today (May 27, 2023) and write a poem.
TASK LIST=[
  {"id":1,"task":"AI news today","tool":"web-search","dependent_task_ids":[],"status":"incomplete","result":null},
  {"id":2,"task":"Summarize a news article","tool":"text-completion","dependent_task_ids":[1],"status":"incomplete","result":null},
  {"id":3,"task":"Pick up important news","tool":"text-completion","dependent_task_ids":[2],"status":"incomplete","result":null},
  {"id":4,"task":"Final summary report","tool":"text-completion","dependent_task_ids":[1,2,3],"status":"incomplete","result":null}
]"#;

const GITHUB_EXAMPLE: &str = r#"{"id":5,"task":"Open an issue with the report","tool":"github-tool","name":"createIssue","config":{"owner":"octocat","repo":"hello-world","title":"Weekly report","body":"..."},"dependent_task_ids":[4],"status":"incomplete","result":null}"#;

pub fn task_creation(objective: &str, language: &str, offer: ToolOffer) -> String {
    let mut prompt = format!(
        "You are an expert task creation AI tasked with creating a list of tasks as a JSON array, \
considering the ultimate objective of your team: {objective}.\n\
Create new tasks based on the objective. Limit task types to those that can be completed with \
the available tools listed below. Task description should be detailed.\n\
Task description must be answered in {language}.\n\
Current tool options are {tools}.\n",
        tools = offer.listing(),
    );

    if offer.web_search {
        prompt.push_str(
            "\nFor tasks using [web-search], provide the search query, and only the search query \
to use (e.g., not 'research waterproof shoes', but 'waterproof shoes'). The result will be a \
summary of relevant information from the first few results.\n\
When requiring multiple searches, use [web-search] multiple times. This tool will use the \
dependent task result to generate the search query if necessary.\n",
        );
    }
    if offer.user_input {
        prompt.push_str(
            "\nUse [user-input] sparingly and only if you need to ask a question to the user who \
set up the objective. The task description should be the question you want to ask the user.\n",
        );
    }
    if offer.github {
        prompt.push_str(
            "\nFor GitHub tasks, use [github-tool] with a \"name\" naming the action (for example \
createIssue, listIssues, createPullRequest, listCommits, searchRepos) and a \"config\" object \
holding its fields. Example:\n",
        );
        prompt.push_str(GITHUB_EXAMPLE);
        prompt.push('\n');
    }

    prompt.push('\n');
    prompt.push_str(TASK_LIST_EXAMPLE);
    prompt.push_str(&format!("\nOBJECTIVE={objective}\nTASK LIST=\n"));
    prompt
}

pub fn text_completion(objective: &str, language: &str, task: &str, context: &str) -> String {
    let mut prompt = format!(
        "You are an AI who performs one task based on the following objective: {objective}.\n"
    );
    if !context.trim().is_empty() {
        prompt.push_str(&format!(
            "Take into account these previously completed tasks:\n{context}\n"
        ));
    }
    prompt.push_str(&format!(
        "Your task: {task}\nAnswer in {language}.\nResponse:"
    ));
    prompt
}

pub fn search_query(objective: &str, task: &str, context: &str) -> String {
    format!(
        "You are an AI assistant that writes web search queries.\n\
OBJECTIVE: {objective}\n\
TASK: {task}\n\
RESULTS OF DEPENDENT TASKS:\n{context}\n\
Write the single best search query for this task. Reply with the query only."
    )
}

pub fn search_summary(
    objective: &str,
    language: &str,
    task: &str,
    query: &str,
    snippets: &str,
) -> String {
    format!(
        "You are an AI assistant summarizing web search results.\n\
OBJECTIVE: {objective}\n\
TASK: {task}\n\
SEARCH QUERY: {query}\n\
RESULTS:\n{snippets}\n\
Summarize the information relevant to the task in {language}. Keep source URLs next to the \
facts they support."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_listing_reflects_offer() {
        let all = ToolOffer {
            web_search: true,
            user_input: true,
            github: true,
        };
        assert_eq!(
            all.listing(),
            "[text-completion] [web-search] [user-input] [github-tool]"
        );

        let minimal = ToolOffer {
            user_input: true,
            ..ToolOffer::default()
        };
        let prompt = task_creation("write a poem", "French", minimal);
        assert!(prompt.contains("Current tool options are [text-completion] [user-input]."));
        assert!(!prompt.contains("For tasks using [web-search]"));
        assert!(prompt.contains("answered in French"));
        assert!(prompt.ends_with("OBJECTIVE=write a poem\nTASK LIST=\n"));
    }

    #[test]
    fn test_text_completion_omits_empty_context() {
        let prompt = text_completion("O", "English", "do it", "  ");
        assert!(!prompt.contains("previously completed"));
        let prompt = text_completion("O", "English", "do it", "A: x\n");
        assert!(prompt.contains("previously completed tasks:\nA: x\n"));
    }
}
