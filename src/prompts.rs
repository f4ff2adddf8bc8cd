use crate::diners::{Diner, Reservation};

pub const INSIGHT_SYSTEM_PROMPT: &str = r####"
You are an AI assistant helping a fine-dining restaurant prepare for their morning huddle.
Your job is to analyze guest history and extract actionable insights for front-of-house staff.

Based on the guest's reviews, previous reservations, and email communications, identify:
1. Dietary restrictions and allergies (be specific)
2. Special occasions (birthdays, anniversaries, celebrations, etc.)
3. VIP status (Regular visitor, First-time, VIP based on spending/loyalty)
4. Special requests or accommodation needs
5. Important staff notes (preferences, dislikes, accessibility needs)
6. Conversation topics (interests, personal details staff should remember)

Respond in JSON format with these exact keys:
{
    "dietary_restrictions": ["list of dietary restrictions"],
    "allergies": ["list of specific allergies"],
    "special_occassion": "description of any special occasion or empty string",
    "priority": "VIP|Regular|First-time",
    "special_requests": ["list of special requests"],
    "staff_notes": "important notes for staff to remember",
    "conversation": ["topics staff can discuss with guest"]
}"####;

pub const INSIGHT_USER_PROMPT_HEADER: &str = r####"Guest Name: {name}
Upcoming Reservation: {date} for {people} people

=== GUEST HISTORY ===
"####;

pub const INSIGHT_USER_PROMPT_FOOTER: &str = "\nPlease analyze this guest's history and provide insights for the upcoming reservation.";

/// Render a diner's history for one upcoming reservation.
///
/// Only reservations strictly before `reservation.date` (time included when
/// the dataset has one) are listed under
/// previous reservations; the section header is still emitted whenever the
/// diner has any reservation at all.
pub fn build_analysis_prompt(diner: &Diner, reservation: &Reservation) -> String {
    let mut prompt = INSIGHT_USER_PROMPT_HEADER
        .replace("{name}", &diner.name)
        .replace("{date}", &reservation.date.to_string())
        .replace("{people}", &reservation.number_of_people.to_string());

    if !diner.reviews.is_empty() {
        prompt.push_str("\n--- REVIEWS ---\n");
        for review in &diner.reviews {
            prompt.push_str(&format!("Date: {}\n", review.date));
            prompt.push_str(&format!("Restaurant: {}\n", review.restaurant_name));
            prompt.push_str(&format!("Rating: {}/5\n", review.rating));
            prompt.push_str(&format!("Review: {}\n\n", review.content));
        }
    }

    if !diner.reservations.is_empty() {
        prompt.push_str("--- PREVIOUS RESERVATIONS ---\n");
        for previous in diner
            .reservations
            .iter()
            .filter(|r| r.date < reservation.date)
        {
            prompt.push_str(&format!(
                "Date: {}, People: {}\n",
                previous.date, previous.number_of_people
            ));
            for order in &previous.orders {
                prompt.push_str(&format!(
                    "  - {} (${:.2}) - Tags: [{}]\n",
                    order.item,
                    order.price,
                    order.dietary_tags.join(", ")
                ));
            }
            prompt.push('\n');
        }
    }

    if !diner.emails.is_empty() {
        prompt.push_str("--- EMAIL COMMUNICATIONS ---\n");
        for email in &diner.emails {
            prompt.push_str(&format!("Date: {}\n", email.date));
            prompt.push_str(&format!("Subject: {}\n", email.subject));
            prompt.push_str(&format!("Content: {}\n\n", email.combined_thread));
        }
    }

    prompt.push_str(INSIGHT_USER_PROMPT_FOOTER);
    prompt
}
