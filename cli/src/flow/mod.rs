pub mod answer;
pub mod run;
