use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_QUESTION_COUNT: u8 = 5;
pub const MAX_QUESTION_COUNT: u8 = 20;
pub const MIN_TIME_PER_QUESTION: u32 = 5;
pub const MAX_TIME_PER_QUESTION: u32 = 60;
pub const MAX_NAME_LENGTH: usize = 35;
pub const OPTION_COUNT: usize = 4;
pub const NO_ANSWER: i8 = -1;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Active,
    Finished,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub question_count: u8,
    pub time_per_question: u32,
    pub hard_mode: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            question_count: 10,
            time_per_question: 15,
            hard_mode: false,
        }
    }
}

/// Server-side question. `correct_index`, `correct_name` and `pokemon_id`
/// never leave the server before the asking player has answered.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: String,
    pub image_url: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub correct_name: String,
    pub pokemon_id: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientQuestion {
    pub question_id: String,
    pub image_url: String,
    pub options: Vec<String>,
}

impl From<&Question> for ClientQuestion {
    fn from(question: &Question) -> Self {
        Self {
            question_id: question.question_id.clone(),
            image_url: question.image_url.clone(),
            options: question.options.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub player_id: String,
    pub name: String,
    pub score: u32,
    pub connected: bool,
    pub is_host: bool,
}

impl PlayerInfo {
    pub fn new(name: &str, is_host: bool) -> Self {
        Self {
            player_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            score: 0,
            connected: true,
            is_host,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAnswer {
    pub selected_index: i8,
    pub correct: bool,
    pub points_earned: u32,
    pub time_remaining: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub session_id: String,
    pub questions: Vec<Question>,
    pub current_question_index: usize,
    /// Join order is the vector order.
    pub players: Vec<PlayerInfo>,
    pub status: SessionStatus,
    pub room_code: Option<String>,
    pub is_multiplayer: bool,
    pub settings: GameSettings,
    pub answered_questions: HashMap<String, HashMap<String, PlayerAnswer>>,
    pub created_at: DateTime<Utc>,
}

impl GameSession {
    pub fn single_player(host: PlayerInfo, questions: Vec<Question>, settings: GameSettings) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            questions,
            current_question_index: 0,
            players: vec![host],
            status: SessionStatus::Active,
            room_code: None,
            is_multiplayer: false,
            settings,
            answered_questions: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn multiplayer(
        session_id: String,
        host: PlayerInfo,
        questions: Vec<Question>,
        settings: GameSettings,
        room_code: String,
    ) -> Self {
        Self {
            session_id,
            questions,
            current_question_index: 0,
            players: vec![host],
            status: SessionStatus::Waiting,
            room_code: Some(room_code),
            is_multiplayer: true,
            settings,
            answered_questions: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerInfo> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut PlayerInfo> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.question_id == question_id)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    pub fn connected_players(&self) -> impl Iterator<Item = &PlayerInfo> {
        self.players.iter().filter(|p| p.connected)
    }

    pub fn name_taken(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.players.iter().any(|p| p.name.to_lowercase() == lowered)
    }

    pub fn answer_of(&self, question_id: &str, player_id: &str) -> Option<&PlayerAnswer> {
        self.answered_questions
            .get(question_id)
            .and_then(|answers| answers.get(player_id))
    }

    pub fn all_connected_answered(&self, question_id: &str) -> bool {
        let answers = self.answered_questions.get(question_id);
        self.connected_players().all(|p| {
            answers
                .map(|a| a.contains_key(&p.player_id))
                .unwrap_or(false)
        })
    }

    /// True once no player can still answer anything: the game finished, or
    /// every player has answered every question.
    pub fn results_ready(&self) -> bool {
        if self.status == SessionStatus::Finished {
            return true;
        }

        self.status == SessionStatus::Active
            && self.questions.iter().all(|q| {
                self.players
                    .iter()
                    .all(|p| self.answer_of(&q.question_id, &p.player_id).is_some())
            })
    }

    /// Score descending, ties keep join order.
    pub fn standings(&self) -> Vec<PlayerInfo> {
        let mut players = self.players.clone();
        players.sort_by(|a, b| b.score.cmp(&a.score));
        players
    }

    pub fn question_results(&self, question_id: &str) -> Vec<AnswerEntry> {
        let Some(answers) = self.answered_questions.get(question_id) else {
            return vec![];
        };

        self.players
            .iter()
            .filter_map(|p| {
                answers.get(&p.player_id).map(|answer| AnswerEntry {
                    player_id: p.player_id.clone(),
                    name: p.name.clone(),
                    answer: *answer,
                })
            })
            .collect()
    }
}

/* Results returned by the lifecycle service */

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub player_id: String,
    pub name: String,
    #[serde(flatten)]
    pub answer: PlayerAnswer,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SinglePlayerCreated {
    pub session_id: String,
    pub player_id: String,
    pub questions: Vec<ClientQuestion>,
    pub settings: GameSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MultiplayerCreated {
    pub session_id: String,
    pub player_id: String,
    pub room_code: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JoinResult {
    pub session_id: String,
    pub player_id: String,
    pub players: Vec<PlayerInfo>,
    pub settings: GameSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StartResult {
    pub question: ClientQuestion,
    pub question_index: usize,
    pub total_questions: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub correct: bool,
    pub correct_answer: String,
    pub points_earned: u32,
    pub total_score: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MultiplayerAnswerResult {
    #[serde(flatten)]
    pub result: AnswerResult,
    pub all_answered: bool,
    pub standings: Vec<PlayerInfo>,
    pub question_results: Vec<AnswerEntry>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBreakdown {
    pub question_id: String,
    pub correct_name: String,
    pub image_url: String,
    pub answers: HashMap<String, PlayerAnswer>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionResults {
    pub players: Vec<PlayerInfo>,
    pub questions: Vec<QuestionBreakdown>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OwnAnswer {
    #[serde(flatten)]
    pub answer: PlayerAnswer,
    pub correct_answer: String,
}

/// What a polling client sees of a session.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub current_question_index: usize,
    pub total_questions: usize,
    pub question: Option<ClientQuestion>,
    pub players: Vec<PlayerInfo>,
    pub answered: Vec<String>,
    pub your_answer: Option<OwnAnswer>,
}

/* Requests */

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub name: String,
    #[serde(default)]
    pub settings: GameSettings,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub room_code: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRequest {
    pub player_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub player_id: String,
    pub question_id: String,
    pub selected_index: i8,
    pub time_remaining: f64,
}

#[derive(Debug, Deserialize)]
pub struct StateQuery {
    pub player_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestionResponse {
    pub question: Option<ClientQuestion>,
    pub question_index: usize,
    pub finished: bool,
}
