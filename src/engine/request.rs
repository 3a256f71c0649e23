use serde::{Deserialize, Serialize};

use crate::catalog::PlayerId;
use crate::combat::resolver::RoundHints;
use crate::core::error::{CombatError, CombatResult};

/// One answer event as sent by the request layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub player_id: PlayerId,
    pub level_id: u32,
    pub enemy_id: u32,
    pub answer_correct: bool,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub elapsed_seconds: f64,
    #[serde(default)]
    pub challenge_id: Option<u32>,
    #[serde(default)]
    pub already_answered_correctly: Option<bool>,
    #[serde(default)]
    pub was_ever_wrong: Option<bool>,
    #[serde(default)]
    pub is_bonus_round: bool,
    #[serde(default)]
    pub is_completing_bonus: bool,
    #[serde(default)]
    pub bonus_total_questions: u32,
    #[serde(default)]
    pub bonus_all_correct: bool,
}

impl TurnRequest {
    pub fn new(player_id: PlayerId, level_id: u32, enemy_id: u32, answer_correct: bool) -> Self {
        Self {
            player_id,
            level_id,
            enemy_id,
            answer_correct,
            answer: String::new(),
            elapsed_seconds: 0.0,
            challenge_id: None,
            already_answered_correctly: None,
            was_ever_wrong: None,
            is_bonus_round: false,
            is_completing_bonus: false,
            bonus_total_questions: 0,
            bonus_all_correct: false,
        }
    }

    pub fn with_challenge(mut self, challenge_id: u32, answer: impl Into<String>) -> Self {
        self.challenge_id = Some(challenge_id);
        self.answer = answer.into();
        self
    }

    pub fn with_elapsed(mut self, seconds: f64) -> Self {
        self.elapsed_seconds = seconds;
        self
    }

    pub fn with_bonus(mut self, completing: bool, total_questions: u32, all_correct: bool) -> Self {
        self.is_bonus_round = true;
        self.is_completing_bonus = completing;
        self.bonus_total_questions = total_questions;
        self.bonus_all_correct = all_correct;
        self
    }

    /// Parses a request body. Malformed JSON and unparseable identifiers
    /// are both invalid input.
    pub fn from_json(json: &str) -> CombatResult<Self> {
        serde_json::from_str(json).map_err(|e| CombatError::invalid(format!("turn request: {}", e)))
    }

    pub fn hints(&self) -> RoundHints {
        RoundHints {
            is_bonus_round: self.is_bonus_round,
            is_completing_bonus: self.is_completing_bonus,
            bonus_all_correct: self.bonus_all_correct,
            bonus_total_questions: self.bonus_total_questions,
            already_answered_correctly: self.already_answered_correctly,
            was_ever_wrong: self.was_ever_wrong,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_request() {
        let json = r#"{
            "playerId": "6f1c2a1e-8d3b-4c55-9a0e-2b7f4d9c1e22",
            "levelId": 3,
            "enemyId": 7,
            "answerCorrect": true
        }"#;
        let req = TurnRequest::from_json(json).unwrap();
        assert_eq!(req.level_id, 3);
        assert_eq!(req.challenge_id, None);
        assert!(!req.is_bonus_round);
        assert_eq!(req.hints(), RoundHints::default());
    }

    #[test]
    fn test_parse_full_request() {
        let json = r#"{
            "playerId": "6f1c2a1e-8d3b-4c55-9a0e-2b7f4d9c1e22",
            "levelId": 3,
            "enemyId": 7,
            "answerCorrect": false,
            "answer": "for i in range(3)",
            "elapsedSeconds": 75.9,
            "challengeId": 12,
            "wasEverWrong": true,
            "isBonusRound": true,
            "isCompletingBonus": true,
            "bonusTotalQuestions": 2,
            "bonusAllCorrect": false
        }"#;
        let req = TurnRequest::from_json(json).unwrap();
        assert_eq!(req.challenge_id, Some(12));
        let hints = req.hints();
        assert!(hints.is_completing_bonus);
        assert_eq!(hints.was_ever_wrong, Some(true));
        assert_eq!(hints.already_answered_correctly, None);
    }

    #[test]
    fn test_bad_player_id_is_invalid_input() {
        let json = r#"{"playerId": "not-a-uuid", "levelId": 1, "enemyId": 1, "answerCorrect": true}"#;
        assert!(matches!(
            TurnRequest::from_json(json),
            Err(CombatError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_identifier_is_invalid_input() {
        let json = r#"{"playerId": "6f1c2a1e-8d3b-4c55-9a0e-2b7f4d9c1e22", "answerCorrect": true}"#;
        assert!(matches!(
            TurnRequest::from_json(json),
            Err(CombatError::InvalidInput(_))
        ));
    }
}
