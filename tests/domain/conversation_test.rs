use chrono::Utc;

use palaver::domain::{Conversation, UserId};

#[test]
fn given_new_conversation_when_created_then_fields_are_bound_and_flags_clear() {
    let user_id = UserId::new();
    let conversation = Conversation::new(
        user_id,
        "New Chat".to_string(),
        "gpt-4".to_string(),
        "openai".to_string(),
    );

    assert_eq!(conversation.user_id, user_id);
    assert_eq!(conversation.title, "New Chat");
    assert_eq!(conversation.model_id, "gpt-4");
    assert_eq!(conversation.provider, "openai");
    assert!(!conversation.is_pinned);
    assert!(!conversation.is_archived);
    assert_eq!(conversation.message_count, 0);
    assert!(conversation.last_message.is_none());
    assert!(conversation.last_message_at.is_none());
}

#[test]
fn given_two_conversations_when_created_then_ids_are_unique() {
    let user_id = UserId::new();
    let a = Conversation::new(user_id, "a".into(), "m".into(), "p".into());
    let b = Conversation::new(user_id, "b".into(), "m".into(), "p".into());
    assert_ne!(a.id, b.id);
}

#[test]
fn given_exchange_when_recorded_then_preview_fields_update() {
    let mut conversation = Conversation::new(
        UserId::new(),
        "Chat".to_string(),
        "gpt-4".to_string(),
        "openai".to_string(),
    );
    let at = Utc::now();

    conversation.record_exchange("Hello!", at, 2);

    assert_eq!(conversation.last_message.as_deref(), Some("Hello!"));
    assert_eq!(conversation.last_message_at, Some(at));
    assert_eq!(conversation.message_count, 2);
    assert_eq!(conversation.updated_at, at);
}

#[test]
fn given_rename_when_applied_then_updated_at_moves_forward() {
    let mut conversation = Conversation::new(
        UserId::new(),
        "Old".to_string(),
        "gpt-4".to_string(),
        "openai".to_string(),
    );
    let before = conversation.updated_at;

    conversation.set_title("New".to_string());

    assert_eq!(conversation.title, "New");
    assert!(conversation.updated_at >= before);
}
