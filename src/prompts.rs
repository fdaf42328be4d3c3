//! Prompt pair sent with every comparison.
//!
//! The defaults ask for a comparison along four axes: tone and bias, factual
//! discrepancies, content omissions and overall perspective. A YAML file can
//! replace either instruction:
//!
//! ```yaml
//! system_instruction: You are a terse fact checker.
//! task_instruction: List every factual disagreement between the two sources.
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are an expert analyst. Your task is to meticulously compare two documents about the same topic from different sources: Grokipedia and Wikipedia. Identify key differences in tone, perspective, factual claims, and omissions. Provide a balanced, neutral, and insightful summary of your findings in well-structured Markdown format.";

pub const DEFAULT_TASK_INSTRUCTION: &str = "Please analyze the following texts from Grokipedia and Wikipedia. Based on the content provided, generate a comparative analysis. Focus on:
1.  **Tone and Bias:** Compare the writing style and any potential bias or point of view presented in each source.
2.  **Factual Discrepancies:** Highlight any significant differences in facts, figures, or timelines.
3.  **Content Omissions:** Note if one source includes important information that the other omits.
4.  **Overall Perspective:** Summarize the main angle or narrative each source seems to promote.

Present your analysis in clear, well-organized Markdown.";

/// Persona and task instructions for the generative model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfiguration {
    /// Sets the analyst persona and overall behavior.
    pub system_instruction: String,
    /// The specific comparison requested.
    pub task_instruction: String,
}

impl Default for PromptConfiguration {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            task_instruction: DEFAULT_TASK_INSTRUCTION.to_string(),
        }
    }
}

/// On-disk form; either key may be omitted to keep the default.
#[derive(Debug, Default, Deserialize)]
struct PromptFile {
    system_instruction: Option<String>,
    task_instruction: Option<String>,
}

impl PromptConfiguration {
    /// Parse a YAML prompt file, falling back to the defaults for missing keys.
    ///
    /// An empty document yields the defaults unchanged.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let prompts = PromptConfiguration::from_yaml("task_instruction: Only compare dates.")?;
    /// assert_eq!(prompts.task_instruction, "Only compare dates.");
    /// assert_eq!(prompts.system_instruction, DEFAULT_SYSTEM_INSTRUCTION);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let file: Option<PromptFile> = serde_yaml::from_str(yaml)?;
        Ok(Self::default().merge(file.unwrap_or_default()))
    }

    /// Read and parse a prompt file from disk.
    ///
    /// # Arguments
    ///
    /// * `path` - YAML file with `system_instruction` and/or `task_instruction`
    ///
    /// # Returns
    ///
    /// The merged configuration, or an error if the file cannot be read or
    /// is not valid YAML.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let yaml = tokio::fs::read_to_string(path.as_ref()).await?;
        let prompts = Self::from_yaml(&yaml)?;
        info!("Loaded prompt configuration");
        Ok(prompts)
    }

    /// Replace whichever instructions are given.
    pub fn with_overrides(mut self, system: Option<String>, task: Option<String>) -> Self {
        if let Some(system) = system {
            self.system_instruction = system;
        }
        if let Some(task) = task {
            self.task_instruction = task;
        }
        self
    }

    fn merge(self, file: PromptFile) -> Self {
        self.with_overrides(file.system_instruction, file.task_instruction)
    }
}
