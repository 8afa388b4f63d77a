use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, clap::ValueEnum)]
pub enum Subject {
    Maths,
    Science,
}

impl Subject {
    pub const ALL: [Subject; 2] = [Subject::Maths, Subject::Science];

    pub fn label(&self) -> &'static str {
        match self {
            Subject::Maths => "Maths",
            Subject::Science => "Science",
        }
    }

    /// Key of the subject's table in the `subjects` section of config.lua.
    pub fn config_key(&self) -> &'static str {
        match self {
            Subject::Maths => "maths",
            Subject::Science => "science",
        }
    }

    pub fn default_suffix(&self) -> &'static str {
        match self {
            Subject::Maths => "Line 4",
            Subject::Science => "Line 5",
        }
    }

    pub fn default_table(&self) -> Vec<String> {
        match self {
            Subject::Maths => vec![],
            Subject::Science => vec!["Practical".to_string(), "Equipment".to_string()],
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
