//! End-to-end conversation scenarios over the in-memory store
//!
//! Run with: cargo test --test conversation_test

mod common;

use chrono::Local;
use common::{adopter, animal, shelter, volunteer, TestEnvironment};
use pretty_assertions::assert_eq;
use shelterbot::conversation::catalog::{texts, MenuCommand};
use shelterbot::conversation::{DataField, InboundEvent, Keyboard, OutboundMessage, PhotoRef, PhotoVariant};
use shelterbot::core::{AnimalState, UserState};
use shelterbot::storage::EntityStore;

const USER_CHAT: i64 = 100;
const VOLUNTEER_CHAT: i64 = 900;

fn forwarded(message_id: i32, text: &str) -> String {
    texts::question_for_volunteer(message_id, text)
}

/// A user with an open question routed to the volunteer
async fn with_open_question(env: &TestEnvironment) -> i64 {
    let vol = env.store.insert_user(volunteer(VOLUNTEER_CHAT)).await;
    let out = env.press(USER_CHAT, &format!("ask:{}", vol.id)).await;
    assert_eq!(out, vec![OutboundMessage::text(USER_CHAT, texts::WRITE_QUESTION)]);
    vol.id
}

// ============================================================================
// First contact and menus
// ============================================================================

mod first_contact {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_start_creates_user_and_lists_shelters() {
        let env = TestEnvironment::new();
        env.store.insert_shelter(shelter("Happy Paws")).await;

        let out = env
            .send(InboundEvent::message(USER_CHAT, 1, "/start").from_sender("Ann"))
            .await;

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, texts::CHOOSE_SHELTER);
        match &out[0].keyboard {
            Some(Keyboard::Inline(rows)) => assert_eq!(rows[0][0].label, "Happy Paws (dogs)"),
            other => panic!("expected shelter buttons, got {:?}", other),
        }

        let user = env.store.find_user_by_chat_id(USER_CHAT).await.unwrap().unwrap();
        assert_eq!(user.state, UserState::Search);
        assert_eq!(user.name.as_deref(), Some("Ann"));
    }

    #[tokio::test]
    async fn test_unrecognised_text_creates_user_silently() {
        let env = TestEnvironment::new();

        let out = env.text(USER_CHAT, 1, "hello?").await;

        assert!(out.is_empty());
        assert!(env.store.find_user_by_chat_id(USER_CHAT).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_choosing_a_shelter_opens_main_menu() {
        let env = TestEnvironment::new();
        let home = env.store.insert_shelter(shelter("Happy Paws")).await;

        let out = env.press(USER_CHAT, &format!("shelter:{}", home.id)).await;

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, texts::SHELTER_SELECTED);
        assert!(matches!(out[0].keyboard, Some(Keyboard::Reply(_))));
        let user = env.store.find_user_by_chat_id(USER_CHAT).await.unwrap().unwrap();
        assert_eq!(user.shelter_id, Some(home.id));

        let info = env.press(USER_CHAT, "info:about").await;
        assert_eq!(
            info,
            vec![OutboundMessage::text(USER_CHAT, "Happy Paws takes care of dogs since 2010")]
        );
    }

    #[tokio::test]
    async fn test_unknown_shelter_is_reported() {
        let env = TestEnvironment::new();

        let out = env.press(USER_CHAT, "shelter:77").await;

        assert_eq!(out, vec![OutboundMessage::text(USER_CHAT, "error: shelter #77 not found")]);
    }

    #[tokio::test]
    async fn test_info_requires_a_shelter() {
        let env = TestEnvironment::new();

        let out = env.text(USER_CHAT, 1, MenuCommand::ShelterInfo.label()).await;

        assert_eq!(out, vec![OutboundMessage::text(USER_CHAT, texts::NO_SHELTER)]);
    }

    #[tokio::test]
    async fn test_unknown_callback_token_is_ignored() {
        let env = TestEnvironment::new();
        assert!(env.press(USER_CHAT, "launch:rocket").await.is_empty());
    }
}

// ============================================================================
// Question relay between user and volunteer
// ============================================================================

mod questions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_first_question_is_forwarded_and_acknowledged() {
        let env = TestEnvironment::new();
        with_open_question(&env).await;

        let out = env.text(USER_CHAT, 42, "Can I visit on Sunday?").await;

        assert_eq!(
            out,
            vec![
                OutboundMessage::text(VOLUNTEER_CHAT, forwarded(42, "Can I visit on Sunday?")),
                OutboundMessage::text(USER_CHAT, texts::SENT_TO_VOLUNTEER),
            ]
        );
        let pending = env.engine.pending_question(USER_CHAT).await.unwrap();
        assert_eq!(pending.volunteer_chat_id, VOLUNTEER_CHAT);
        assert_eq!(pending.forwarded_message_id, Some(42));
        assert!(pending.answer_text.is_none());
    }

    #[tokio::test]
    async fn test_second_message_is_not_forwarded_again() {
        let env = TestEnvironment::new();
        with_open_question(&env).await;
        env.text(USER_CHAT, 42, "Can I visit on Sunday?").await;

        let out = env.text(USER_CHAT, 43, "Hello?").await;

        assert_eq!(out, vec![OutboundMessage::text(USER_CHAT, texts::NOT_ANSWERED_YET)]);
        let pending = env.engine.pending_question(USER_CHAT).await.unwrap();
        assert_eq!(pending.forwarded_message_id, Some(42));
    }

    #[tokio::test]
    async fn test_volunteer_reply_closes_the_question() {
        let env = TestEnvironment::new();
        with_open_question(&env).await;
        env.text(USER_CHAT, 42, "Can I visit on Sunday?").await;

        let reply = InboundEvent::message(VOLUNTEER_CHAT, 7, "Sure, from 10 to 16")
            .replying_to(500, forwarded(42, "Can I visit on Sunday?"));
        let out = env.send(reply).await;

        assert_eq!(
            out,
            vec![OutboundMessage::text(USER_CHAT, texts::volunteer_reply("Sure, from 10 to 16"))]
        );
        assert!(env.engine.pending_question(USER_CHAT).await.is_none());

        // The chat is free again: plain text no longer goes anywhere
        assert!(env.text(USER_CHAT, 44, "thanks").await.is_empty());
    }

    #[tokio::test]
    async fn test_unrelated_reply_produces_nothing() {
        let env = TestEnvironment::new();
        with_open_question(&env).await;
        env.text(USER_CHAT, 42, "Can I visit on Sunday?").await;

        let unrelated = InboundEvent::message(VOLUNTEER_CHAT, 8, "ok").replying_to(501, "see you tomorrow");
        let unknown_id = InboundEvent::message(VOLUNTEER_CHAT, 9, "ok").replying_to(502, "99: old question");

        assert!(env.send(unrelated).await.is_empty());
        assert!(env.send(unknown_id).await.is_empty());
        assert!(env.engine.pending_question(USER_CHAT).await.is_some());
    }

    #[tokio::test]
    async fn test_only_the_assigned_volunteer_can_answer() {
        let env = TestEnvironment::new();
        with_open_question(&env).await;
        env.store.insert_user(volunteer(901)).await;
        env.text(USER_CHAT, 42, "Can I visit on Sunday?").await;

        let intruder = InboundEvent::message(901, 3, "No").replying_to(500, forwarded(42, "Can I visit on Sunday?"));

        assert!(env.send(intruder).await.is_empty());
        assert!(env.engine.pending_question(USER_CHAT).await.is_some());
    }

    #[tokio::test]
    async fn test_ask_any_without_volunteers() {
        let env = TestEnvironment::new();

        let out = env.press(USER_CHAT, "ask:any").await;

        assert_eq!(out, vec![OutboundMessage::text(USER_CHAT, texts::NO_VOLUNTEERS)]);
        assert!(env.engine.pending_question(USER_CHAT).await.is_none());
    }

    #[tokio::test]
    async fn test_asking_twice_keeps_one_question() {
        let env = TestEnvironment::new();
        env.store.insert_user(volunteer(VOLUNTEER_CHAT)).await;
        env.store.insert_user(volunteer(901)).await;

        env.press(USER_CHAT, "ask:any").await;
        env.press(USER_CHAT, "ask:any").await;
        let out = env.text(USER_CHAT, 42, "Is Rex vaccinated?").await;

        // One forward, to whichever volunteer the last press picked
        assert_eq!(out.len(), 2);
        let pending = env.engine.pending_question(USER_CHAT).await.unwrap();
        assert_eq!(out[0].chat_id, pending.volunteer_chat_id);
    }

    #[tokio::test]
    async fn test_asking_a_non_volunteer_fails_cleanly() {
        let env = TestEnvironment::new();
        let other = env.store.insert_user(adopter(555, UserState::Search)).await;

        let out = env.press(USER_CHAT, &format!("ask:{}", other.id)).await;

        assert_eq!(out.len(), 1);
        assert!(out[0].text.starts_with("error: volunteer #"));
        assert!(env.engine.pending_question(USER_CHAT).await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_messages_forward_once() {
        let env = TestEnvironment::new();
        with_open_question(&env).await;

        let (a, b) = tokio::join!(
            env.text(USER_CHAT, 42, "first"),
            env.text(USER_CHAT, 43, "second")
        );

        let forwards = a.iter().chain(b.iter()).filter(|m| m.chat_id == VOLUNTEER_CHAT).count();
        assert_eq!(forwards, 1);
        assert_eq!(a.len() + b.len(), 3);
    }
}

// ============================================================================
// Contact data and daily reports
// ============================================================================

mod data_entry {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_phone_is_validated_and_saved() {
        let env = TestEnvironment::new();

        let prompt = env.press(USER_CHAT, "field:user_phone").await;
        assert_eq!(prompt, vec![OutboundMessage::text(USER_CHAT, DataField::UserPhone.prompt())]);
        assert_eq!(env.engine.pending_field(USER_CHAT).await, Some(DataField::UserPhone));

        let out = env.text(USER_CHAT, 2, "+7 (912) 345-67-89").await;

        assert_eq!(out, vec![OutboundMessage::text(USER_CHAT, texts::DATA_RECORDED)]);
        let user = env.store.find_user_by_chat_id(USER_CHAT).await.unwrap().unwrap();
        assert_eq!(user.phone.as_deref(), Some("+7 (912) 345-67-89"));
        assert!(env.engine.pending_field(USER_CHAT).await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_email_discards_the_request() {
        let env = TestEnvironment::new();
        env.press(USER_CHAT, "field:user_email").await;

        let out = env.text(USER_CHAT, 2, "not an address").await;

        assert_eq!(out.len(), 1);
        assert!(out[0].text.starts_with("error: "));
        assert!(env.engine.pending_field(USER_CHAT).await.is_none());
        let user = env.store.find_user_by_chat_id(USER_CHAT).await.unwrap().unwrap();
        assert!(user.email.is_none());
    }

    #[tokio::test]
    async fn test_report_text_fields_share_todays_report() {
        let env = TestEnvironment::new();
        let user = env.store.insert_user(adopter(USER_CHAT, UserState::Probation)).await;
        let rex = env.store.insert_animal(animal("Rex", Some(user.id), AnimalState::InTest)).await;
        let mut user = user;
        user.animal_id = Some(rex.id);
        env.store.save_user(&user).await.unwrap();

        env.press(USER_CHAT, "field:report_diet").await;
        env.text(USER_CHAT, 2, "Two bowls of kibble").await;
        env.press(USER_CHAT, "field:report_wellbeing").await;
        env.text(USER_CHAT, 3, "Playful").await;

        let reports = env.store.reports_of_user(user.id).await;
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.date, Local::now().date_naive());
        assert_eq!(report.animal_id, Some(rex.id));
        assert_eq!(report.diet.as_deref(), Some("Two bowls of kibble"));
        assert_eq!(report.wellbeing.as_deref(), Some("Playful"));
    }

    #[tokio::test]
    async fn test_photo_field_waits_for_a_photo() {
        let env = TestEnvironment::new();
        let user = env.store.insert_user(adopter(USER_CHAT, UserState::Probation)).await;
        env.press(USER_CHAT, "field:report_photo").await;

        let out = env.text(USER_CHAT, 2, "here it comes").await;
        assert_eq!(out, vec![OutboundMessage::text(USER_CHAT, texts::SEND_PHOTO)]);
        assert_eq!(env.engine.pending_field(USER_CHAT).await, Some(DataField::ReportPhoto));

        let photo = PhotoRef::new(vec![
            PhotoVariant {
                file_id: "thumb".to_string(),
                width: 90,
                height: 90,
                file_size: Some(1_000),
            },
            PhotoVariant {
                file_id: "full".to_string(),
                width: 1280,
                height: 960,
                file_size: Some(120_000),
            },
        ]);
        let out = env.send(InboundEvent::photo(USER_CHAT, 3, photo, None)).await;

        assert_eq!(out, vec![OutboundMessage::text(USER_CHAT, texts::DATA_RECORDED)]);
        assert_eq!(env.media.requested(), vec!["full".to_string()]);
        let reports = env.store.reports_of_user(user.id).await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].photo.as_deref(), Some(common::fixtures::PHOTO_BYTES));
    }

    #[tokio::test]
    async fn test_menu_press_keeps_pending_request() {
        let env = TestEnvironment::new();
        env.press(USER_CHAT, "field:user_phone").await;

        let out = env.text(USER_CHAT, 2, MenuCommand::LeaveContacts.label()).await;

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, texts::LEAVE_CONTACTS);
        assert_eq!(env.engine.pending_field(USER_CHAT).await, Some(DataField::UserPhone));
    }

    #[tokio::test]
    async fn test_new_request_replaces_the_previous_one() {
        let env = TestEnvironment::new();
        env.press(USER_CHAT, "field:user_phone").await;
        env.press(USER_CHAT, "field:user_email").await;

        assert_eq!(env.engine.pending_field(USER_CHAT).await, Some(DataField::UserEmail));
        let out = env.text(USER_CHAT, 3, "ann@example.org").await;
        assert_eq!(out, vec![OutboundMessage::text(USER_CHAT, texts::DATA_RECORDED)]);
    }

    #[tokio::test]
    async fn test_question_takes_precedence_over_data_request() {
        let env = TestEnvironment::new();
        env.press(USER_CHAT, "field:user_phone").await;
        with_open_question(&env).await;

        let out = env.text(USER_CHAT, 5, "+7 900 123 45 67").await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].chat_id, VOLUNTEER_CHAT);
        assert_eq!(env.engine.pending_field(USER_CHAT).await, Some(DataField::UserPhone));
    }
}
