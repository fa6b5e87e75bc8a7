#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use crate::{
        quiz::{
            generator::{GeneratorError, MIN_POOL_SIZE, QuestionGenerator},
            models::{GameSettings, Question},
        },
        tests::support::{FakeProvider, record, settings, setup_logging},
    };

    fn assert_well_formed(questions: &[Question]) {
        for question in questions {
            assert_eq!(question.options.len(), 4);

            let distinct: HashSet<&String> = question.options.iter().collect();
            assert_eq!(distinct.len(), 4, "duplicate option in {:?}", question.options);

            assert_eq!(question.options[question.correct_index], question.correct_name);
        }

        let answers: HashSet<&String> = questions.iter().map(|q| &q.correct_name).collect();
        assert_eq!(answers.len(), questions.len());

        let ids: HashSet<&String> = questions.iter().map(|q| &q.question_id).collect();
        assert_eq!(ids.len(), questions.len());
    }

    fn type_matches(provider: &FakeProvider, question: &Question) -> usize {
        let Some(answer) = provider.lookup(&question.correct_name) else {
            return 0;
        };

        question
            .options
            .iter()
            .filter(|option| **option != question.correct_name)
            .filter_map(|option| provider.lookup(option))
            .filter(|distractor| distractor.shares_type(answer))
            .count()
    }

    #[tokio::test]
    async fn generates_requested_number_of_well_formed_questions() {
        setup_logging();
        let provider = Arc::new(FakeProvider::with_species(300));
        let generator = QuestionGenerator::new(provider.clone(), 20).with_seed(11);

        for count in [5u8, 12, 20] {
            let questions = generator.generate(&settings(count)).await.unwrap();
            assert_eq!(questions.len(), count as usize);
            assert_well_formed(&questions);
        }
    }

    #[tokio::test]
    async fn distractors_prefer_shared_types() {
        let provider = Arc::new(FakeProvider::with_species(300));
        let generator = QuestionGenerator::new(provider.clone(), 20).with_seed(5);

        let questions = generator.generate(&settings(6)).await.unwrap();
        for question in &questions {
            assert!(type_matches(&provider, question) >= 2);
        }

        let hard = GameSettings {
            hard_mode: true,
            ..settings(6)
        };
        let questions = generator.generate(&hard).await.unwrap();
        for question in &questions {
            assert_eq!(type_matches(&provider, question), 3);
        }
    }

    #[tokio::test]
    async fn retries_when_artwork_is_missing() {
        let records = (1..=25).map(|id| record(id, &format!("Species{}", id)));
        let provider = Arc::new(FakeProvider::from_records(200, records));
        let generator = QuestionGenerator::new(provider.clone(), 20).with_seed(3);

        let questions = generator.generate(&settings(5)).await.unwrap();

        assert_eq!(questions.len(), 5);
        assert_well_formed(&questions);
        assert!(provider.fetched() > MIN_POOL_SIZE);
    }

    #[tokio::test]
    async fn forms_of_one_species_count_once() {
        let records = (1..=300).map(|id| record(id, &format!("Species{}", id % 30)));
        let provider = Arc::new(FakeProvider::from_records(300, records));
        let generator = QuestionGenerator::new(provider, 20).with_seed(9);

        let result = generator.generate(&settings(10)).await;

        match result {
            Err(GeneratorError::InsufficientData { found, required }) => {
                assert_eq!(found, 30);
                assert_eq!(required, 40);
            }
            other => panic!("Expected insufficient data, got {:?}", other.map(|q| q.len())),
        }
    }

    #[tokio::test]
    async fn single_fetch_failures_are_skipped() {
        let provider = Arc::new(FakeProvider::with_species(200).failing_on((1..=20).collect()));
        let generator = QuestionGenerator::new(provider, 20).with_seed(4);

        let questions = generator.generate(&settings(5)).await.unwrap();

        assert_eq!(questions.len(), 5);
        assert!(questions.iter().all(|q| q.pokemon_id > 20));
    }

    #[tokio::test]
    async fn unreachable_provider_is_an_error() {
        let generator = QuestionGenerator::new(Arc::new(FakeProvider::unreachable()), 20);

        let result = generator.generate(&settings(5)).await;
        assert!(matches!(result, Err(GeneratorError::Provider(_))));
    }
}
