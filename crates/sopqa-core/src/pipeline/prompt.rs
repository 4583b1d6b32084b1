use super::RetrievedDocument;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions about \
Clinical Research Enterprise (CRE) Standard Operating Procedures (SOPs).

Instructions:
- Answer based ONLY on the provided SOP context
- Cite the SOP number when providing information
- If the answer isn't in the context, say so clearly
- Be concise and specific
- Use bullet points for procedures/steps";

/// Retrieved contents, each headed by its SOP number and title, in
/// retrieval order.
#[must_use]
pub fn build_context(docs: &[RetrievedDocument]) -> String {
    docs.iter()
        .map(|d| format!("[SOP {} - {}]\n{}", d.sop_number, d.title, d.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[must_use]
pub fn user_message(context: &str, question: &str) -> String {
    format!(
        "Context from SOPs:\n{context}\n\nQuestion: {question}\n\n\
         Please provide a clear, accurate answer based on the SOP context above."
    )
}

#[must_use]
pub fn format_source(doc: &RetrievedDocument) -> String {
    format!("SOP {}: {} ({})", doc.sop_number, doc.title, doc.section)
}
