//! Deterministic prompt construction for the solution generator.
//!
//! Field order is fixed; optional lines are omitted entirely when the field
//! is absent, so the same ticket always yields the same prompt.

use super::Ticket;

pub fn prompt_from_ticket(ticket: &Ticket) -> String {
    let mut prompt = String::from(
        "You are an IT support specialist. Analyze the following ticket and \
         provide a detailed solution.\n\nTicket Details:\n",
    );
    prompt.push_str(&format!("- ID: {}\n", ticket.id));
    prompt.push_str(&format!(
        "- Problem Source: {}\n",
        ticket.problem_source.as_str()
    ));
    prompt.push_str(&format!(
        "- Specific Problem: {}\n",
        ticket.specific_problem.as_str()
    ));
    if let Some(issue) = ticket.software_issue {
        prompt.push_str(&format!("- Software Issue: {}\n", issue.as_str()));
    }
    if let Some(date) = ticket.date {
        prompt.push_str(&format!("- Date: {}\n", date.format("%Y-%m-%d")));
    }
    if !ticket.description.is_empty() {
        prompt.push_str(&format!("- Description: {}\n", ticket.description));
    }
    if !ticket.files.is_empty() {
        prompt.push_str(&format!(
            "- Attached Files: {} file(s)\n",
            ticket.files.len()
        ));
    }
    prompt.push_str(
        "\nPlease provide:\n\
         1. A brief analysis of the problem\n\
         2. Step-by-step troubleshooting instructions\n\
         3. Potential causes\n\
         4. Prevention tips\n\n\
         Keep the response professional and easy to follow.",
    );
    prompt
}
