use palaver::domain::{ConversationId, Message, MessageRole, MessageStatus};

#[test]
fn given_new_user_message_when_created_then_starts_sending() {
    let message = Message::user(ConversationId::new(), "Hi".to_string());

    assert_eq!(message.role, MessageRole::User);
    assert_eq!(message.status, MessageStatus::Sending);
    assert!(!message.is_edited);
    assert!(message.error_message.is_none());
}

#[test]
fn given_new_assistant_message_when_created_then_starts_generating_and_empty() {
    let message = Message::assistant(ConversationId::new());

    assert_eq!(message.role, MessageRole::Assistant);
    assert_eq!(message.status, MessageStatus::Generating);
    assert!(message.content.is_empty());
}

#[test]
fn given_message_when_failing_then_error_is_set_with_failed_status() {
    let mut message = Message::assistant(ConversationId::new());
    message.fail("rate limited".to_string());

    assert_eq!(message.status, MessageStatus::Failed);
    assert_eq!(message.error_message.as_deref(), Some("rate limited"));
}

#[test]
fn given_message_when_completing_then_error_is_cleared() {
    let mut message = Message::assistant(ConversationId::new());
    message.complete("Hello!".to_string());

    assert_eq!(message.status, MessageStatus::Completed);
    assert_eq!(message.content, "Hello!");
    assert!(message.error_message.is_none());
}

#[test]
fn given_every_mutator_when_applied_then_failed_iff_error_message() {
    let mut sent = Message::user(ConversationId::new(), "a".to_string());
    sent.mark_sent();
    assert_eq!(
        sent.status == MessageStatus::Failed,
        sent.error_message.is_some()
    );

    let mut failed = Message::user(ConversationId::new(), "b".to_string());
    failed.fail("boom".to_string());
    assert_eq!(
        failed.status == MessageStatus::Failed,
        failed.error_message.is_some()
    );
}

#[test]
fn given_message_when_edited_then_content_and_flag_change() {
    let mut message = Message::user(ConversationId::new(), "Helo".to_string());
    message.edit("Hello".to_string());

    assert_eq!(message.content, "Hello");
    assert!(message.is_edited);
}
