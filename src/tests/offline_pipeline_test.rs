#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::config::{AggregatorConfig, ResolverConfig};
    use crate::models::{Difficulty, PerformanceBand};
    use crate::offline::OfflineQuizApi;
    use crate::quiz_aggregator::QuizAggregator;
    use crate::quiz_controller::QuizController;
    use crate::quiz_session::{GenerationOutcome, SessionState};

    fn offline_controller(seed: u64) -> QuizController {
        let aggregator = QuizAggregator::new(
            Arc::new(OfflineQuizApi::new()),
            ResolverConfig::default(),
            AggregatorConfig {
                shuffle_seed: Some(seed),
                ..AggregatorConfig::default()
            },
        );
        QuizController::new(Arc::new(aggregator))
    }

    #[tokio::test]
    async fn test_two_topic_quiz_end_to_end() {
        let controller = offline_controller(3);
        controller.add_topic("Python").unwrap();
        controller.add_topic("Rust").unwrap();
        controller.set_difficulty(Difficulty::Medium).unwrap();

        assert_eq!(controller.generate().await.unwrap(), GenerationOutcome::Applied);

        let quiz = controller.quiz().unwrap();
        assert_eq!(quiz.title, "Multi-Topic Quiz: Python, Rust");
        assert_eq!(quiz.topics, vec!["Python", "Rust"]);
        assert_eq!(quiz.len(), 10);

        let mut per_topic: HashMap<&str, usize> = HashMap::new();
        for question in &quiz.questions {
            *per_topic.entry(question.source_topic.as_str()).or_default() += 1;
        }
        assert_eq!(per_topic.get("Python"), Some(&5));
        assert_eq!(per_topic.get("Rust"), Some(&5));

        for (index, question) in quiz.questions.iter().enumerate() {
            controller.select_answer(index, question.answer_index).unwrap();
        }
        let score = controller.submit().unwrap();
        assert_eq!(score.percentage, 100);
        assert_eq!(score.performance(), PerformanceBand::Excellent);
        assert_eq!(controller.state(), SessionState::Submitted);
    }

    #[tokio::test]
    async fn test_same_seed_gives_same_order() {
        let mut orders = Vec::new();
        for _ in 0..2 {
            let controller = offline_controller(99);
            controller
                .configure(&["Go".to_string(), "Rust".to_string()], Some(Difficulty::Hard))
                .unwrap();
            controller.generate().await.unwrap();
            let prompts: Vec<String> = controller
                .quiz()
                .unwrap()
                .questions
                .into_iter()
                .map(|q| q.prompt)
                .collect();
            orders.push(prompts);
        }
        assert_eq!(orders[0], orders[1]);
        assert_eq!(orders[0].len(), 14);
    }

    #[tokio::test]
    async fn test_resume_quiz_end_to_end() {
        let controller = offline_controller(5);
        let outcome = controller
            .generate_from_resume("jane_doe.pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();

        assert_eq!(outcome, GenerationOutcome::Applied);
        let quiz = controller.quiz().unwrap();
        assert_eq!(quiz.title, "Resume Assessment: jane_doe.pdf");
        assert_eq!(quiz.difficulty, Difficulty::Medium);
        assert_eq!(quiz.len(), 5);
        assert!(quiz.questions.iter().all(|q| q.source_topic == "jane_doe.pdf"));
    }

    #[tokio::test]
    async fn test_invalid_resume_never_leaves_idle() {
        let controller = offline_controller(5);
        assert!(controller.generate_from_resume("notes.txt", vec![1]).await.is_err());
        assert_eq!(controller.state(), SessionState::Idle);
    }
}
