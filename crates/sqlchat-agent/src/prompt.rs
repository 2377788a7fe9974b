//! Prompt construction for the two model calls of each exchange.
//!
//! Both builders are pure: they assemble text from the question, the schema
//! rendering, and the query result. Threading the content into the session
//! history is the memory manager's job.

use sqlchat_core::QueryResult;

/// System turn installed at index 0 when a session opens.
pub const SQL_SYSTEM_PROMPT: &str = "\
You are a helpful assistant for generating SQL queries. \
Pay attention to use only the column names that you can see in the schema description. \
Be careful to not query for columns that do not exist. \
Also, pay attention to which column is in which table.";

/// Instruction appended to every user turn so later questions can lean on
/// earlier turns.
pub const CHAT_INSTRUCTION: &str = "\
Use prior turns of this conversation for context, and refer back to them \
explicitly when relevant.";

/// Compose the question prompt content: fixed rules, the fenced-block output
/// contract, the question, the schema, and the previous attempt's feedback
/// when there is one.
pub fn build_question_content(question: &str, schema_text: &str, feedback: Option<&str>) -> String {
    let mut content = format!(
        "Your task is to convert a question into a syntactically correct SQL query, \
given a database schema.\n\
Adhere to these rules:\n\
- Deliberately go through the question and database schema word by word to \
appropriately answer the question\n\
- Use table aliases to prevent ambiguity. For example, \
`SELECT t1.col1, t2.col1 FROM table1 t1 JOIN table2 t2 ON t1.id = t2.id`.\n\
- When creating a ratio, always cast the numerator as float\n\
- Return the SQL query inside a fenced code block tagged `sql`, \
i.e. ```sql ... ```\n\
\n\
Generate a SQL query that answers the question: `{question}`.\n\
This query will run on a database whose schema is represented by these \
CREATE TABLE statements:\n\
\n\
{schema_text}"
    );

    if let Some(feedback) = feedback {
        content.push_str("\n\nThe previous attempt failed. ");
        content.push_str(feedback);
        content.push_str(" Correct the problem and answer again.");
    }

    content
}

/// Compose the answer prompt content: the executed SQL, a capped rendering
/// of its result, and the original question.
pub fn build_answer_content(
    question: &str,
    sql: &str,
    result: &QueryResult,
    row_limit: usize,
) -> String {
    format!(
        "The following SQL query was executed against the database:\n\
\n\
```sql\n{sql}\n```\n\
\n\
{preview}\n\
\n\
Using this result, answer the original question: `{question}`.\n\
Answer in plain language. If a further SQL query is needed, return it inside \
a fenced code block tagged `sql`.",
        preview = render_result_preview(result, row_limit)
    )
}

/// Render at most `row_limit` rows verbatim; beyond that, state how many
/// rows were elided and the total so the model knows data is missing.
pub fn render_result_preview(result: &QueryResult, row_limit: usize) -> String {
    let mut preview = format!("It returned the columns ({}).", result.columns.join(", "));

    if result.rows.is_empty() {
        preview.push_str("\nThe result set is empty.");
        return preview;
    }

    preview.push_str("\nRows:");
    for row in result.rows.iter().take(row_limit) {
        preview.push_str("\n(");
        preview.push_str(&row.join(", "));
        preview.push(')');
    }

    let total = result.rows.len();
    if total > row_limit {
        preview.push_str(&format!(
            "\n... {} more rows not shown; {} rows in total.",
            total - row_limit,
            total
        ));
    }

    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_content_carries_rules_question_and_schema() {
        let content = build_question_content("how many users?", "CREATE TABLE users (id INTEGER);", None);
        assert!(content.contains("word by word"));
        assert!(content.contains("table aliases"));
        assert!(content.contains("cast the numerator as float"));
        assert!(content.contains("```sql"));
        assert!(content.contains("`how many users?`"));
        assert!(content.contains("CREATE TABLE users"));
        assert!(!content.contains("previous attempt"));
    }

    #[test]
    fn feedback_lands_as_extra_instruction_paragraph() {
        let content = build_question_content(
            "q",
            "schema",
            Some("Generation failed for error: no such column: nam"),
        );
        assert!(content.contains("The previous attempt failed."));
        assert!(content.contains("no such column: nam"));
    }

    #[test]
    fn answer_content_embeds_sql_result_and_question() {
        let result = QueryResult::new(vec!["n".into()], vec![vec!["5".into()]]);
        let content = build_answer_content("how many?", "SELECT COUNT(*) AS n FROM t", &result, 20);
        assert!(content.contains("```sql\nSELECT COUNT(*) AS n FROM t\n```"));
        assert!(content.contains("(5)"));
        assert!(content.contains("`how many?`"));
    }

    #[test]
    fn preview_caps_rows_and_reports_the_total() {
        let rows: Vec<Vec<String>> = (0..1000).map(|i| vec![i.to_string()]).collect();
        let result = QueryResult::new(vec!["id".into()], rows);
        let preview = render_result_preview(&result, 20);

        assert!(preview.contains("(0)"));
        assert!(preview.contains("(19)"));
        assert!(!preview.contains("(20)\n"));
        assert!(preview.contains("980 more rows not shown"));
        assert!(preview.contains("1000 rows in total"));
    }

    #[test]
    fn preview_under_the_cap_is_verbatim() {
        let result = QueryResult::new(
            vec!["id".into()],
            vec![vec!["1".into()], vec!["2".into()]],
        );
        let preview = render_result_preview(&result, 20);
        assert!(preview.contains("(1)"));
        assert!(preview.contains("(2)"));
        assert!(!preview.contains("more rows"));
    }

    #[test]
    fn empty_result_is_stated_outright() {
        let result = QueryResult::new(vec!["id".into()], vec![]);
        let preview = render_result_preview(&result, 20);
        assert!(preview.contains("result set is empty"));
    }
}
