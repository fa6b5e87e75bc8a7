use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    key_vault::key_vault::KeyVault,
    quiz::{
        generator::QuestionGenerator,
        models::{
            AnswerResult, ClientQuestion, GameSession, GameSettings, JoinResult,
            MultiplayerAnswerResult, MultiplayerCreated, NO_ANSWER, NextQuestionResponse,
            OwnAnswer, PlayerAnswer, PlayerInfo, QuestionBreakdown, SessionResults,
            SessionSnapshot, SessionStatus, SinglePlayerCreated, StartResult,
        },
        scoring::{ScoringRules, clamp_time},
    },
    server::error::ServerError,
    session::store::SessionStore,
};

pub const DEFAULT_MAX_PLAYERS: usize = 20;
pub const MIN_PLAYERS_TO_START: usize = 2;

/// Session lifecycle. Every read-modify-write goes through
/// `SessionStore::mutate`, and a failing validation aborts before anything
/// is written.
pub struct QuizService {
    store: SessionStore,
    vault: KeyVault,
    generator: QuestionGenerator,
    rules: ScoringRules,
    max_players: usize,
}

impl QuizService {
    pub fn new(
        store: SessionStore,
        vault: KeyVault,
        generator: QuestionGenerator,
        rules: ScoringRules,
        max_players: usize,
    ) -> Self {
        Self {
            store,
            vault,
            generator,
            rules,
            max_players,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn vault(&self) -> &KeyVault {
        &self.vault
    }

    pub fn generator(&self) -> &QuestionGenerator {
        &self.generator
    }

    pub async fn create_single_player(
        &self,
        name: &str,
        settings: GameSettings,
    ) -> Result<SinglePlayerCreated, ServerError> {
        let questions = self.generator.generate(&settings).await?;
        let host = PlayerInfo::new(name, true);
        let player_id = host.player_id.clone();
        let session = GameSession::single_player(host, questions, settings);

        let created = SinglePlayerCreated {
            session_id: session.session_id.clone(),
            player_id,
            questions: session.questions.iter().map(ClientQuestion::from).collect(),
            settings,
        };

        self.store.create(session)?;
        info!("Created single player session {}", created.session_id);

        Ok(created)
    }

    pub async fn create_multiplayer(
        &self,
        name: &str,
        settings: GameSettings,
    ) -> Result<MultiplayerCreated, ServerError> {
        let questions = self.generator.generate(&settings).await?;
        let session_id = Uuid::new_v4().to_string();
        let room_code = self.vault.create_key(&session_id)?;

        let host = PlayerInfo::new(name, true);
        let player_id = host.player_id.clone();
        let session = GameSession::multiplayer(
            session_id.clone(),
            host,
            questions,
            settings,
            room_code.clone(),
        );

        if let Err(e) = self.store.create(session) {
            self.vault.remove_key(&room_code, &session_id);
            return Err(e.into());
        }

        info!(
            "Created multiplayer session {} with room code {}",
            session_id, room_code
        );

        Ok(MultiplayerCreated {
            session_id,
            player_id,
            room_code,
        })
    }

    pub async fn join(&self, room_code: &str, name: &str) -> Result<JoinResult, ServerError> {
        let Some(session_id) = self.vault.lookup(room_code) else {
            debug!("Join attempt with unknown room code {}", room_code);
            return Err(ServerError::NotFound(format!(
                "No waiting game with room code {}",
                room_code
            )));
        };

        let max_players = self.max_players;
        let result = self
            .store
            .mutate(&session_id, |session| {
                if session.status != SessionStatus::Waiting {
                    return Err(ServerError::NotFound(format!(
                        "No waiting game with room code {}",
                        room_code
                    )));
                }

                if session.players.len() >= max_players {
                    return Err(ServerError::Conflict("The room is full".into()));
                }

                if session.name_taken(name) {
                    return Err(ServerError::Conflict(format!(
                        "The name {} is already taken in this room",
                        name
                    )));
                }

                let player = PlayerInfo::new(name, false);
                let player_id = player.player_id.clone();
                session.players.push(player);

                Ok(JoinResult {
                    session_id: session.session_id.clone(),
                    player_id,
                    players: session.players.clone(),
                    settings: session.settings,
                })
            })
            .await?;

        info!(
            "Player {} joined session {}",
            result.player_id, result.session_id
        );
        Ok(result)
    }

    pub async fn start_game(
        &self,
        session_id: &str,
        player_id: &str,
    ) -> Result<StartResult, ServerError> {
        let result = self
            .store
            .mutate(session_id, |session| {
                ensure_host(session, player_id, "start the game")?;

                if session.status != SessionStatus::Waiting {
                    return Err(ServerError::Precondition(
                        "The game has already started".into(),
                    ));
                }

                let connected = session.connected_players().count();
                if connected < MIN_PLAYERS_TO_START {
                    return Err(ServerError::Precondition(format!(
                        "At least {} connected players are needed, found {}",
                        MIN_PLAYERS_TO_START, connected
                    )));
                }

                let Some(first) = session.questions.first().map(ClientQuestion::from) else {
                    return Err(ServerError::Internal("Session has no questions".into()));
                };

                session.status = SessionStatus::Active;
                session.current_question_index = 0;

                Ok(StartResult {
                    question: first,
                    question_index: 0,
                    total_questions: session.questions.len(),
                })
            })
            .await?;

        info!("Session {} started by host {}", session_id, player_id);
        Ok(result)
    }

    pub async fn submit_answer(
        &self,
        session_id: &str,
        player_id: &str,
        question_id: &str,
        selected_index: i8,
        time_remaining: f64,
    ) -> Result<AnswerResult, ServerError> {
        let rules = self.rules;
        let result = self
            .store
            .mutate(session_id, |session| {
                record_answer(
                    session,
                    &rules,
                    player_id,
                    question_id,
                    selected_index,
                    time_remaining,
                )
            })
            .await?;

        debug!(
            "Player {} answered {} in session {}: {} points",
            player_id, question_id, session_id, result.points_earned
        );
        Ok(result)
    }

    /// Records the answer and, in the same critical section, reports whether
    /// every connected player has now answered together with the standings.
    pub async fn submit_multiplayer_answer(
        &self,
        session_id: &str,
        player_id: &str,
        question_id: &str,
        selected_index: i8,
        time_remaining: f64,
    ) -> Result<MultiplayerAnswerResult, ServerError> {
        let rules = self.rules;
        let result = self
            .store
            .mutate(session_id, |session| {
                let result = record_answer(
                    session,
                    &rules,
                    player_id,
                    question_id,
                    selected_index,
                    time_remaining,
                )?;

                Ok::<_, ServerError>(MultiplayerAnswerResult {
                    result,
                    all_answered: session.all_connected_answered(question_id),
                    standings: session.standings(),
                    question_results: session.question_results(question_id),
                })
            })
            .await?;

        if result.all_answered {
            info!(
                "All connected players answered {} in session {}",
                question_id, session_id
            );
        }
        Ok(result)
    }

    /// Moves to the next question. Returns `None` once the last question is
    /// passed and the session is finished.
    pub async fn advance_question(
        &self,
        session_id: &str,
    ) -> Result<Option<ClientQuestion>, ServerError> {
        let response = self.advance(session_id, None).await?;
        Ok(response.question)
    }

    pub async fn advance_as_host(
        &self,
        session_id: &str,
        player_id: &str,
    ) -> Result<NextQuestionResponse, ServerError> {
        self.advance(session_id, Some(player_id)).await
    }

    async fn advance(
        &self,
        session_id: &str,
        host_id: Option<&str>,
    ) -> Result<NextQuestionResponse, ServerError> {
        let (response, released_code) = self
            .store
            .mutate(session_id, |session| {
                if let Some(host_id) = host_id {
                    ensure_host(session, host_id, "advance the game")?;
                }

                if session.status != SessionStatus::Active {
                    return Err(ServerError::Precondition(
                        "Only an active game can advance".into(),
                    ));
                }

                let next = session.current_question_index + 1;
                if next >= session.questions.len() {
                    session.current_question_index = session.questions.len();
                    session.status = SessionStatus::Finished;

                    let response = NextQuestionResponse {
                        question: None,
                        question_index: session.current_question_index,
                        finished: true,
                    };
                    return Ok((response, session.room_code.clone()));
                }

                session.current_question_index = next;
                let response = NextQuestionResponse {
                    question: session.current_question().map(ClientQuestion::from),
                    question_index: next,
                    finished: false,
                };
                Ok((response, None))
            })
            .await?;

        if response.finished {
            if let Some(code) = released_code {
                self.vault.remove_key(&code, session_id);
            }
            info!("Session {} finished", session_id);
        } else {
            debug!(
                "Session {} advanced to question {}",
                session_id, response.question_index
            );
        }

        Ok(response)
    }

    /// Final standings and the answer breakdown. Only available once no
    /// player can still answer a question, as the breakdown names every
    /// correct answer.
    pub async fn get_results(&self, session_id: &str) -> Result<SessionResults, ServerError> {
        let session = self.load(session_id).await?;

        if !session.results_ready() {
            return Err(ServerError::Precondition(
                "Results are available once every question is answered or the game has finished"
                    .into(),
            ));
        }

        let questions = session
            .questions
            .iter()
            .map(|question| QuestionBreakdown {
                question_id: question.question_id.clone(),
                correct_name: question.correct_name.clone(),
                image_url: question.image_url.clone(),
                answers: session
                    .answered_questions
                    .get(&question.question_id)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();

        Ok(SessionResults {
            players: session.standings(),
            questions,
        })
    }

    /// Polling view of a session for one player. The correct answer of the
    /// current question is only included once that player has answered it.
    pub async fn get_state(
        &self,
        session_id: &str,
        player_id: &str,
    ) -> Result<SessionSnapshot, ServerError> {
        let session = self.load(session_id).await?;

        if session.player(player_id).is_none() {
            return Err(ServerError::NotFound(format!(
                "Player {} is not part of this session",
                player_id
            )));
        }

        let current = match session.status {
            SessionStatus::Active => session.current_question(),
            _ => None,
        };

        let (answered, your_answer) = match current {
            Some(question) => {
                let answered = session
                    .question_results(&question.question_id)
                    .into_iter()
                    .map(|entry| entry.player_id)
                    .collect();

                let own = session
                    .answer_of(&question.question_id, player_id)
                    .map(|answer| OwnAnswer {
                        answer: *answer,
                        correct_answer: question.correct_name.clone(),
                    });

                (answered, own)
            }
            None => (vec![], None),
        };

        Ok(SessionSnapshot {
            status: session.status,
            current_question_index: session.current_question_index,
            total_questions: session.questions.len(),
            question: current.map(ClientQuestion::from),
            players: session.players.clone(),
            answered,
            your_answer,
        })
    }

    /// Marks a player as disconnected and hands host status to the earliest
    /// joined player still connected.
    pub async fn remove_player(
        &self,
        session_id: &str,
        player_id: &str,
    ) -> Result<Vec<PlayerInfo>, ServerError> {
        let (players, new_host) = self
            .store
            .mutate(session_id, |session| {
                let Some(player) = session.player_mut(player_id) else {
                    return Err(ServerError::NotFound(format!(
                        "Player {} is not part of this session",
                        player_id
                    )));
                };

                if !player.connected {
                    return Ok((session.players.clone(), None));
                }

                player.connected = false;
                let was_host = player.is_host;
                player.is_host = false;

                let mut new_host = None;
                if was_host {
                    if let Some(next) = session.players.iter_mut().find(|p| p.connected) {
                        next.is_host = true;
                        new_host = Some(next.player_id.clone());
                    }
                }

                Ok((session.players.clone(), new_host))
            })
            .await?;

        info!("Player {} left session {}", player_id, session_id);
        if let Some(host) = new_host {
            info!("Player {} is now host of session {}", host, session_id);
        }

        Ok(players)
    }

    /// Evicts expired sessions, then releases every room code whose session
    /// is gone. Room codes live exactly as long as their session.
    pub fn sweep_expired(&self) -> (usize, usize) {
        sweep(&self.store, &self.vault)
    }

    pub fn spawn_cleanup(&self, every: Duration) -> JoinHandle<()> {
        let store = self.store.clone();
        let vault = self.vault.clone();
        let mut interval = tokio::time::interval(every);

        tokio::spawn(async move {
            loop {
                interval.tick().await;
                debug!("QuizService is cleaning up expired sessions");

                let (sessions, codes) = sweep(&store, &vault);
                if sessions > 0 || codes > 0 {
                    info!(
                        "Evicted {} expired sessions and released {} room codes",
                        sessions, codes
                    );
                }
            }
        })
    }

    async fn load(&self, session_id: &str) -> Result<GameSession, ServerError> {
        self.store
            .get(session_id)
            .await?
            .ok_or_else(|| ServerError::NotFound(format!("Session {} does not exist", session_id)))
    }
}

fn sweep(store: &SessionStore, vault: &KeyVault) -> (usize, usize) {
    let sessions = store.evict_expired();
    let codes = vault.release_orphans(|session_id| store.contains(session_id));
    (sessions, codes)
}

fn ensure_host(session: &GameSession, player_id: &str, action: &str) -> Result<(), ServerError> {
    let is_host = session
        .player(player_id)
        .map(|player| player.is_host)
        .unwrap_or(false);

    if !is_host {
        warn!(
            "Player {} tried to {} in session {} without being host",
            player_id, action, session.session_id
        );
        return Err(ServerError::Forbidden(format!(
            "Only the host can {}",
            action
        )));
    }

    Ok(())
}

/// Validates and records one answer. The checks run in a fixed order and
/// none of them writes, so a rejected answer leaves the session unchanged.
fn record_answer(
    session: &mut GameSession,
    rules: &ScoringRules,
    player_id: &str,
    question_id: &str,
    selected_index: i8,
    time_remaining: f64,
) -> Result<AnswerResult, ServerError> {
    if session.status != SessionStatus::Active {
        return Err(ServerError::NotFound("Game is not active".into()));
    }

    let Some(question) = session.question(question_id).cloned() else {
        return Err(ServerError::NotFound(format!(
            "Question {} is not part of this session",
            question_id
        )));
    };

    // Single player sessions may answer their questions in any order.
    if session.is_multiplayer {
        let is_current = session
            .current_question()
            .map(|current| current.question_id == question_id)
            .unwrap_or(false);

        if !is_current {
            return Err(ServerError::Precondition(
                "Answers are only accepted for the current question".into(),
            ));
        }
    }

    if session.player(player_id).is_none() {
        return Err(ServerError::NotFound(format!(
            "Player {} is not part of this session",
            player_id
        )));
    }

    if session.answer_of(question_id, player_id).is_some() {
        return Err(ServerError::Conflict(
            "This question has already been answered".into(),
        ));
    }

    let total_time = session.settings.time_per_question;
    let time_remaining = clamp_time(time_remaining, total_time);
    let correct = selected_index != NO_ANSWER
        && usize::try_from(selected_index).ok() == Some(question.correct_index);
    let points_earned = rules.score(correct, time_remaining, total_time);

    session
        .answered_questions
        .entry(question_id.to_string())
        .or_default()
        .insert(
            player_id.to_string(),
            PlayerAnswer {
                selected_index,
                correct,
                points_earned,
                time_remaining,
            },
        );

    let Some(player) = session.player_mut(player_id) else {
        return Err(ServerError::Internal("Player vanished mid update".into()));
    };
    player.score += points_earned;

    Ok(AnswerResult {
        correct,
        correct_answer: question.correct_name,
        points_earned,
        total_score: player.score,
    })
}
