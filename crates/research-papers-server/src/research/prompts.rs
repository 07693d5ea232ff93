//! `generate_search_prompt`

use std::collections::HashMap;

use async_trait::async_trait;
use research_papers_protocol::{McpError, McpResult, PromptArgument, PromptMessage};

use crate::prompt::McpPrompt;

const DEFAULT_NUM_PAPERS: u32 = 5;

/// Walks a client through searching, reading and summarising papers on a topic
pub struct GenerateSearchPrompt;

#[async_trait]
impl McpPrompt for GenerateSearchPrompt {
    fn name(&self) -> &str {
        "generate_search_prompt"
    }

    fn description(&self) -> Option<&str> {
        Some("Generate a prompt for finding and discussing academic papers on a specific topic")
    }

    fn arguments(&self) -> Vec<PromptArgument> {
        vec![
            PromptArgument::new("topic", "The research topic to search for", true),
            PromptArgument::new(
                "num_papers",
                "Number of papers to retrieve (default: 5)",
                false,
            ),
        ]
    }

    async fn render(&self, args: HashMap<String, String>) -> McpResult<Vec<PromptMessage>> {
        let topic = args
            .get("topic")
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| McpError::missing_param("topic"))?;

        let num_papers = match args.get("num_papers") {
            None => DEFAULT_NUM_PAPERS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(McpError::param_out_of_range(
                        "num_papers",
                        raw,
                        "must be a positive integer",
                    ));
                }
            },
        };

        Ok(vec![PromptMessage::user_text(search_instructions(
            topic, num_papers,
        ))])
    }
}

fn search_instructions(topic: &str, num_papers: u32) -> String {
    format!(
        "Search for {num_papers} academic papers about '{topic}' using the search_papers tool.

Follow these instructions:
1. First, search for papers using search_papers(topic='{topic}', max_results={num_papers})
2. For each paper found, call extract_info(paper_id) and organize the following information:
   - Paper title
   - Authors
   - Publication date
   - Brief summary of the key findings
   - Main contributions or innovations
   - Methodologies used
   - Relevance to the topic '{topic}'

3. Provide a comprehensive summary that includes:
   - Overview of the current state of research in '{topic}'
   - Common themes and trends across the papers
   - Key research gaps or areas for future investigation
   - Most impactful or influential papers in this area

4. Organize your findings in a clear, structured format with headings and bullet points for easy readability.

Please present both detailed information about each paper and a high-level synthesis of the research landscape in {topic}."
    )
}
