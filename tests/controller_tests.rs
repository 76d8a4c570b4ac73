mod common;

use std::sync::Arc;

use common::{controller, names, GenerationFault, ScriptedQuizApi};
use topic_quiz::{Difficulty, GenerationOutcome, SessionError, SessionState, ValidationError};

#[tokio::test]
async fn test_invalid_selection_never_reaches_the_service() {
    let api = Arc::new(ScriptedQuizApi::new());
    let controller = controller(api.clone());

    controller.configure(&[], Some(Difficulty::Easy)).unwrap();
    assert_eq!(
        controller.generate().await,
        Err(SessionError::Validation(ValidationError::NoTopics))
    );

    controller.configure(&names(&["Rust"]), None).unwrap();
    assert_eq!(
        controller.generate().await,
        Err(SessionError::Validation(ValidationError::MissingDifficulty))
    );

    assert!(matches!(
        controller.configure(&names(&["A", "B", "C", "D"]), Some(Difficulty::Easy)),
        Err(SessionError::Validation(ValidationError::TooManyTopics { .. }))
    ));

    assert_eq!(controller.state(), SessionState::Configuring);
    assert_eq!(api.creates(), 0);
    assert_eq!(api.lists(), 0);
}

#[tokio::test]
async fn test_generate_requires_configuration_first() {
    let controller = controller(Arc::new(ScriptedQuizApi::new()));
    assert!(matches!(
        controller.generate().await,
        Err(SessionError::InvalidTransition { .. })
    ));
    assert_eq!(controller.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_failed_aggregation_returns_to_configuring() {
    let api = Arc::new(ScriptedQuizApi::new().fail_generation("Go", GenerationFault::Unavailable));
    let controller = controller(api);
    controller
        .configure(&names(&["Rust", "Go"]), Some(Difficulty::Medium))
        .unwrap();

    let outcome = controller.generate().await.unwrap();
    match outcome {
        GenerationOutcome::Failed(message) => {
            assert!(message.contains("Go"), "{}", message);
            assert!(!message.contains("Rust"), "{}", message);
        }
        other => panic!("expected failure, got {:?}", other),
    }

    assert_eq!(controller.state(), SessionState::Configuring);
    assert!(controller.quiz().is_none());
    assert!(controller.last_error().is_some());

    // Selection survives, so the user can drop the broken topic and retry
    assert_eq!(controller.selection().topics, names(&["Rust", "Go"]));
    controller.remove_topic("Go").unwrap();
    assert_eq!(controller.generate().await.unwrap(), GenerationOutcome::Applied);
    assert!(controller.last_error().is_none());
    assert_eq!(controller.quiz().unwrap().len(), 5);
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let controller = controller(Arc::new(ScriptedQuizApi::new()));
    controller.toggle_topic("Rust").unwrap();
    controller.set_difficulty(Difficulty::Easy).unwrap();
    assert_eq!(controller.generate().await.unwrap(), GenerationOutcome::Applied);
    assert_eq!(controller.state(), SessionState::InProgress);

    let quiz = controller.quiz().unwrap();
    assert_eq!(quiz.len(), 3);

    controller.select_answer(0, quiz.questions[0].answer_index).unwrap();
    assert_eq!(
        controller.submit(),
        Err(SessionError::IncompleteSubmission { answered: 1, total: 3 })
    );

    controller.select_answer(1, quiz.questions[1].answer_index).unwrap();
    controller
        .select_answer(2, (quiz.questions[2].answer_index + 1) % 4)
        .unwrap();
    assert_eq!(controller.answered_count(), 3);

    let score = controller.submit().unwrap();
    assert_eq!(score.correct, 2);
    assert_eq!(score.percentage, 67);
    assert_eq!(controller.score(), Some(score));

    // Frozen after submission
    controller.select_answer(2, quiz.questions[2].answer_index).unwrap();
    assert_eq!(controller.answers().get(2), Some((quiz.questions[2].answer_index + 1) % 4));

    controller.reset();
    assert_eq!(controller.state(), SessionState::Idle);
    assert!(controller.quiz().is_none());
    assert!(controller.score().is_none());
    assert_eq!(controller.answered_count(), 0);
}

#[tokio::test]
async fn test_resume_validation_happens_before_upload() {
    let controller = controller(Arc::new(ScriptedQuizApi::new()));
    assert!(matches!(
        controller.generate_from_resume("cv.png", vec![1]).await,
        Err(SessionError::Validation(ValidationError::UnsupportedFileType(_)))
    ));

    let outcome = controller.generate_from_resume("cv.pdf", vec![1, 2]).await.unwrap();
    assert_eq!(outcome, GenerationOutcome::Applied);
    assert_eq!(controller.quiz().unwrap().title, "Resume Assessment: cv.pdf");
}
