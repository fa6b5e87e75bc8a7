use crate::{
    quiz::models::{
        CreateSessionRequest, GameSettings, JoinRequest, MAX_NAME_LENGTH, MAX_QUESTION_COUNT,
        MAX_TIME_PER_QUESTION, MIN_QUESTION_COUNT, MIN_TIME_PER_QUESTION, NO_ANSWER,
        OPTION_COUNT, SubmitAnswerRequest,
    },
    server::error::ServerError,
};

pub fn validate_name(name: &str) -> Result<String, ServerError> {
    let trimmed = name.trim();
    let length = trimmed.chars().count();

    if length == 0 || length > MAX_NAME_LENGTH {
        return Err(ServerError::Validation(format!(
            "Name must be between 1 and {} characters",
            MAX_NAME_LENGTH
        )));
    }

    Ok(trimmed.to_string())
}

pub fn validate_settings(settings: &GameSettings) -> Result<(), ServerError> {
    if !(MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(&settings.question_count) {
        return Err(ServerError::Validation(format!(
            "questionCount must be between {} and {}",
            MIN_QUESTION_COUNT, MAX_QUESTION_COUNT
        )));
    }

    if !(MIN_TIME_PER_QUESTION..=MAX_TIME_PER_QUESTION).contains(&settings.time_per_question) {
        return Err(ServerError::Validation(format!(
            "timePerQuestion must be between {} and {} seconds",
            MIN_TIME_PER_QUESTION, MAX_TIME_PER_QUESTION
        )));
    }

    Ok(())
}

impl CreateSessionRequest {
    /// Returns the trimmed player name.
    pub fn validate(&self) -> Result<String, ServerError> {
        validate_settings(&self.settings)?;
        validate_name(&self.name)
    }
}

impl JoinRequest {
    pub fn validate(&self) -> Result<String, ServerError> {
        if self.room_code.trim().is_empty() {
            return Err(ServerError::Validation("roomCode is required".into()));
        }

        validate_name(&self.name)
    }
}

impl SubmitAnswerRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        let valid_index = self.selected_index == NO_ANSWER
            || (0..OPTION_COUNT as i8).contains(&self.selected_index);

        if !valid_index {
            return Err(ServerError::Validation(
                "selectedIndex must be -1, 0, 1, 2 or 3".into(),
            ));
        }

        if !self.time_remaining.is_finite() {
            return Err(ServerError::Validation(
                "timeRemaining must be a number".into(),
            ));
        }

        if self.player_id.is_empty() || self.question_id.is_empty() {
            return Err(ServerError::Validation(
                "playerId and questionId are required".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(selected_index: i8, time_remaining: f64) -> SubmitAnswerRequest {
        SubmitAnswerRequest {
            player_id: "p".into(),
            question_id: "q".into(),
            selected_index,
            time_remaining,
        }
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(validate_name("  Ash ").unwrap(), "Ash");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(36)).is_err());
        assert!(validate_name(&"x".repeat(35)).is_ok());
    }

    #[test]
    fn settings_bounds() {
        let mut settings = GameSettings::default();
        assert!(validate_settings(&settings).is_ok());

        settings.question_count = 4;
        assert!(validate_settings(&settings).is_err());
        settings.question_count = 21;
        assert!(validate_settings(&settings).is_err());
        settings.question_count = 20;
        settings.time_per_question = 61;
        assert!(validate_settings(&settings).is_err());
        settings.time_per_question = 5;
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn selected_index_range() {
        assert!(answer(-1, 3.0).validate().is_ok());
        assert!(answer(3, 3.0).validate().is_ok());
        assert!(answer(4, 3.0).validate().is_err());
        assert!(answer(-2, 3.0).validate().is_err());
        assert!(answer(0, f64::INFINITY).validate().is_err());
    }
}
