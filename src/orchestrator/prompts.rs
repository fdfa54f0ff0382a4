//! Prompt templates for the generative backend

/// Prompt asking for a JSON research plan
pub fn planning_prompt(query: &str) -> String {
    format!(
        r#"You are a research planning expert. Break the following research topic into 3 to 5 concrete research steps.

Research topic: {query}

Respond with JSON only, in exactly this shape:
{{
  "research_plan": [
    {{
      "step": 1,
      "title": "Step title",
      "description": "What this step investigates",
      "search_queries": ["first search query", "second search query"],
      "tool": "comprehensive_search",
      "expected_outcome": "What this step should establish"
    }}
  ]
}}

Allowed values for "tool": "comprehensive_search", "web_search", "wikipedia_search".
Each step should have 2 or 3 focused search queries."#
    )
}

/// Prompt asking for an analysis of one step's search results
pub fn analysis_prompt(step_title: &str, documents: &str) -> String {
    format!(
        r#"Analyze the search results below for the research step "{step_title}".

Search results:
{documents}

Write a focused analysis that:
1. Summarizes the key facts and findings
2. Points out important trends or disagreements between sources
3. Notes gaps that remain open

Keep it concise and grounded in the results."#
    )
}

/// Prompt asking for the final report
pub fn report_prompt(query: &str, findings: &str) -> String {
    format!(
        r#"Write a research report on "{query}" based on the findings below.

Findings:
{findings}

Structure the report in Markdown with:
- An executive summary
- Main findings
- Analysis and discussion
- Conclusions and open questions"#
    )
}
