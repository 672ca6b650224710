//! Prompt templates for the hosted model

/// Answer phrase the grounded prompt asks for when the context is not enough
pub const NO_CONTEXT_ANSWER: &str = "Based on the provided documents, I cannot answer this question.";

pub fn general_prompt(question: &str) -> String {
    format!(
        "You are a helpful assistant. Answer the following question to the best of your ability.\n\n\
         Question: {question}"
    )
}

pub fn grounded_prompt(context: &[&str], question: &str) -> String {
    let context = context.join("\n\n---\n\n");
    format!(
        "You are an expert assistant on power grids. Use the following context to answer the user's question.\n\
         If the context does not contain the answer, say \"{NO_CONTEXT_ANSWER}\"\n\
         Your answer should be clear and based only on the provided text.\n\n\
         Context:\n{context}\n\n\
         Question: {question}"
    )
}
