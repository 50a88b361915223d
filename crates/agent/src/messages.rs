//! Assistant message formatting. Everything the user reads comes from here,
//! so wording changes stay in one place.

use registrar_core::dialogue::state::FieldTag;
use registrar_core::domain::registration::Registration;
use registrar_core::validate::FieldError;

pub fn fallback() -> &'static str {
    "I'm not sure how to help with that. Type 'help' to see what I can do."
}

pub fn help_text() -> &'static str {
    "I'm your registration assistant! I can help you with:\n\n\
     🆕 **Create Registration** - Register with your details\n\
     📖 **Read Registration** - View your existing registration\n\
     ✏️ **Update Registration** - Modify your registration details\n\
     🗑️ **Delete Registration** - Remove your registration\n\n\
     To get started, just tell me what you'd like to do. For example:\n\
     - \"I want to create a new registration\"\n\
     - \"Show me my registration details\"\n\
     - \"I need to update my phone number\"\n\
     - \"Delete my registration\"\n\n\
     What would you like to do?"
}

pub fn goodbye() -> &'static str {
    "👋 Thank you for using the registration assistant. Goodbye!"
}

pub fn create_intro() -> &'static str {
    "I'll help you create a new registration. Let's start!\n\nWhat is your full name?"
}

pub fn read_intro() -> &'static str {
    "I'll retrieve your registration details. What is your email address?"
}

pub fn update_intro() -> &'static str {
    "I'll help you update your registration. First, what is your email address?"
}

pub fn delete_intro() -> &'static str {
    "I'll help you delete your registration. What is your email address?"
}

pub fn validation_reprompt(field: FieldTag, error: &FieldError) -> String {
    format!("❌ {error}\n\nPlease provide a valid {}:", field.ask_label())
}

pub fn email_taken(email: &str) -> String {
    format!("❌ Email {email} is already registered. Please use a different email:")
}

pub fn next_field_prompt(field: FieldTag) -> String {
    format!("✓ Got it! Now, what is your {}?", field.ask_label())
}

pub fn update_field_list() -> String {
    let listing = FieldTag::UPDATEABLE
        .iter()
        .enumerate()
        .map(|(index, field)| format!("{}. {}", index + 1, field.label()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Which field would you like to update?\n\n{listing}\n\nJust tell me the field name or number:"
    )
}

pub fn unresolved_selection() -> &'static str {
    "I couldn't identify that field. Please specify which field you want to update:"
}

pub fn new_value_prompt(field: FieldTag) -> String {
    format!("What is the new value for {}?", field.label())
}

pub fn create_success(record: &Registration) -> String {
    format!(
        "✅ Registration created successfully!\n\n\
         📋 **Your Details:**\n\
         👤 Name: {}\n\
         📧 Email: {}\n\
         📱 Phone: {}\n\
         🎂 Date of Birth: {}\n\
         🏠 Address: {}\n\n\
         Your registration ID is: {}\n\n\
         What else can I help you with?",
        record.full_name,
        record.email,
        record.phone_number,
        record.date_of_birth.format("%Y-%m-%d"),
        record.address,
        record.id,
    )
}

pub fn read_success(record: &Registration) -> String {
    format!(
        "📋 **Your Registration Details:**\n\n\
         👤 Name: {}\n\
         📧 Email: {}\n\
         📱 Phone: {}\n\
         🎂 Date of Birth: {}\n\
         🏠 Address: {}\n\n\
         📅 Registered: {}\n\
         🔄 Last Updated: {}\n\n\
         What else can I help you with?",
        record.full_name,
        record.email,
        record.phone_number,
        record.date_of_birth.format("%Y-%m-%d"),
        record.address,
        record.created_at.format("%Y-%m-%d %H:%M"),
        record.updated_at.format("%Y-%m-%d %H:%M"),
    )
}

pub fn update_success(field: FieldTag, record: &Registration) -> String {
    format!(
        "✅ Successfully updated {}!\n\n\
         📋 **Updated Registration:**\n\
         👤 Name: {}\n\
         📧 Email: {}\n\
         📱 Phone: {}\n\
         🎂 Date of Birth: {}\n\
         🏠 Address: {}\n\n\
         What else can I help you with?",
        field.label(),
        record.full_name,
        record.email,
        record.phone_number,
        record.date_of_birth.format("%Y-%m-%d"),
        record.address,
    )
}

pub fn update_incomplete() -> &'static str {
    "❌ Update information is incomplete"
}

pub fn delete_success(email: &str) -> String {
    format!(
        "✅ Registration for {email} has been successfully deleted.\n\n\
         All your data has been removed from our system.\n\n\
         If you need to register again, just let me know!"
    )
}

pub fn not_found(email: &str) -> String {
    format!("❌ No registration found for email: {email}")
}

pub fn operation_error(detail: &str) -> String {
    format!("❌ An error occurred: {detail}")
}

pub fn unknown_operation() -> &'static str {
    "❌ Unknown operation"
}
