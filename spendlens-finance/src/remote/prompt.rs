//! Prompt text for remote classification.

use spendlens_core::Category;

const SINGLE_EXAMPLES: &str = r#"Examples:
- "Amazon.ae Dubai" or "Amazon Now" → Shopping
- "Carrefour" or "Lulu" or supermarket → Food & Dining
- "Restaurant" or "Food" or "Cafe" → Food & Dining
- "Uber" or "Careem" or "Taxi" or "Metro" → Transportation
- "Dubai Government" or "DEWA" or "Etisalat" → Bills & Utilities
- "Sephora" or "Nike" → Shopping
- "Hospital" or "Pharmacy" → Healthcare"#;

const BATCH_GUIDELINES: &str = r#"Guidelines:
- Amazon, online shopping, retail stores → Shopping
- Carrefour, Lulu, supermarkets, grocery stores, food markets → Food & Dining
- Restaurants, cafes, food delivery, fast food → Food & Dining
- Uber, Careem, taxi, metro, transportation → Transportation
- Government services, utilities, phone/internet bills → Bills & Utilities
- Pharmacies, hospitals, medical → Healthcare
- Salons, gyms, fitness → Personal Care"#;

/// Prompt asking for a bare category name for one cleaned description.
pub fn single_prompt(description: &str) -> String {
    format!(
        "Categorize this bank transaction into ONE of these categories:\n{}\n\n\
Transaction: \"{}\"\n\n\
{}\n\n\
Respond with ONLY the exact category name from the list above, nothing else.",
        Category::label_list(),
        description,
        SINGLE_EXAMPLES
    )
}

/// Prompt asking for a JSON object mapping 1-based indexes to category names.
pub fn batch_prompt(descriptions: &[String]) -> String {
    let listing = descriptions
        .iter()
        .enumerate()
        .map(|(i, d)| format!("{}. {}", i + 1, d))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Categorize these UAE bank transactions into ONE category each from this list:\n{}\n\n\
Transactions:\n{}\n\n\
{}\n\n\
Respond with a JSON object: {{\"1\": \"Category Name\", \"2\": \"Category Name\", ...}}\n\
Use exact category names from the list. Only respond with valid JSON, no other text.",
        Category::label_list(),
        listing,
        BATCH_GUIDELINES
    )
}
