//! Prompt construction
//!
//! Template choice is a pure function of the query text: travel-document
//! questions get the travel template, everything else the general one. Both
//! templates demand a JSON-only reply matching the structured answer shape.

/// Build the full prompt for a raw user query
pub fn build_prompt(query: &str) -> String {
    if is_travel_query(query) {
        travel_prompt(query)
    } else {
        general_prompt(query)
    }
}

/// Case-insensitive keyword heuristic for travel-documentation questions
fn is_travel_query(query: &str) -> bool {
    let query = query.to_lowercase();
    query.contains("travel") && (query.contains("documents") || query.contains("visa"))
}

fn travel_prompt(query: &str) -> String {
    format!(
        r#"You are a concise and expert travel assistant. The user is asking about travel documentation.
Please provide a comprehensive and well-formatted response for the query: "{query}".
Answer directly and avoid lengthy paragraphs or redundant information. Use bullet points for lists.
Structure your response as a JSON object with the following keys. If a category is not applicable or you cannot find specific information, provide an empty array or an empty string.

{{
    "required_visa_documentation": ["List of documents needed for visa application"],
    "passport_requirements": ["Details about passport validity, pages, etc."],
    "additional_necessary_documents": ["Other documents like flight tickets, accommodation proof, yellow fever certificate, etc."],
    "relevant_travel_advisories": ["Any official warnings, health advisories, or entry restrictions"],
    "general_response": "A brief summary or additional helpful information in a single paragraph."
}}

Ensure your response is a valid JSON object and nothing else."#
    )
}

fn general_prompt(query: &str) -> String {
    format!(
        r#"You are a concise and helpful AI assistant.
Please answer the following query: "{query}" with brevity and clarity.
Provide a well-formatted response and do not repeat the same points.
If the answer can be structured into categories like 'required_visa_documentation', 'passport_requirements', 'additional_necessary_documents', 'relevant_travel_advisories', use those categories in a JSON object.
Otherwise, provide a concise answer in the 'general_response' field.
Ensure your response is a valid JSON object.

Example JSON structure (if applicable):
{{
    "required_visa_documentation": ["..."],
    "passport_requirements": ["..."],
    "additional_necessary_documents": ["..."],
    "relevant_travel_advisories": ["..."],
    "general_response": "Your detailed answer here."
}}"#
    )
}
