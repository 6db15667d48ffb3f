use crate::types::QuestionMode;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 1つの質問と回答のエントリ
#[derive(Clone, Debug, Serialize)]
pub struct QaEntry {
    /// エントリID（"q-0" 形式）
    pub id: String,

    /// 質問文
    pub question: String,

    /// 処理モード
    pub mode: QuestionMode,

    /// 回答テキスト
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    /// 根拠の引用文（文字起こし検索モードのみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,

    /// 詳細な解説（LLMモードのみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    /// エラーメッセージ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// 処理中フラグ
    pub is_processing: bool,

    /// 回答が格納された時刻（ISO 8601）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answered_at: Option<String>,
}

impl QaEntry {
    fn new(id: String) -> Self {
        Self {
            id,
            question: String::new(),
            mode: QuestionMode::Transcription,
            answer: None,
            evidence: None,
            explanation: None,
            error: None,
            is_processing: false,
            answered_at: None,
        }
    }

    /// 回答関連のフィールドをクリア
    pub(crate) fn clear_result(&mut self) {
        self.answer = None;
        self.evidence = None;
        self.explanation = None;
        self.error = None;
        self.answered_at = None;
    }
}

/// 質問エントリ一覧の状態
///
/// エントリ数は上限付きで、上限を超える追加は無視される。
/// 共有状態の更新はすべてこの構造体のメソッド経由で行い、
/// 外には複製（スナップショット）だけを渡す。
#[derive(Clone)]
pub struct SessionState {
    entries: Arc<Mutex<Vec<QaEntry>>>,
    next_id: Arc<AtomicUsize>,
    max_entries: usize,
}

impl SessionState {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicUsize::new(0)),
            max_entries,
        }
    }

    /// エントリを追加
    ///
    /// # Returns
    /// 追加したエントリのID。上限に達している場合は `None`。
    pub fn add_entry(&self) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.max_entries {
            log::warn!("質問数が上限 ({}件) に達しています", self.max_entries);
            return None;
        }
        let id = format!("q-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        entries.push(QaEntry::new(id.clone()));
        Some(id)
    }

    /// 質問文を設定
    pub fn set_question(&self, id: &str, question: &str) -> bool {
        self.update_entry(id, |entry| {
            entry.question = question.to_string();
        })
    }

    /// 処理モードを変更
    ///
    /// 以前の回答・根拠・解説・エラーはクリアされる。
    pub fn set_mode(&self, id: &str, mode: QuestionMode) -> bool {
        self.update_entry(id, |entry| {
            entry.mode = mode;
            entry.clear_result();
        })
    }

    /// エントリのスナップショットを取得
    pub fn get_entry(&self, id: &str) -> Option<QaEntry> {
        let entries = self.entries.lock().unwrap();
        entries.iter().find(|entry| entry.id == id).cloned()
    }

    /// 全エントリのスナップショットを取得
    pub fn entries(&self) -> Vec<QaEntry> {
        let entries = self.entries.lock().unwrap();
        entries.clone()
    }

    /// エントリ数
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap();
        entries.len()
    }

    /// エントリが1件もないかどうか
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 全エントリの回答関連フィールドをクリア
    ///
    /// 新しいファイルが選択されたときに呼ぶ。質問文とモードは残る。
    pub fn clear_results(&self) {
        let mut entries = self.entries.lock().unwrap();
        for entry in entries.iter_mut() {
            entry.clear_result();
        }
    }

    /// エントリを更新
    ///
    /// # Returns
    /// 該当IDのエントリが存在したかどうか
    pub(crate) fn update_entry<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut QaEntry),
    {
        let mut entries = self.entries.lock().unwrap();
        match entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                f(entry);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_entry_respects_cap() {
        let state = SessionState::new(10);

        for _ in 0..10 {
            assert!(state.add_entry().is_some());
        }
        assert_eq!(state.len(), 10);

        // 11件目は追加されない
        assert!(state.add_entry().is_none());
        assert_eq!(state.len(), 10);
    }

    #[test]
    fn test_entry_ids_are_unique_and_ordered() {
        let state = SessionState::new(3);
        let ids: Vec<String> = (0..3).map(|_| state.add_entry().unwrap()).collect();
        assert_eq!(ids, vec!["q-0", "q-1", "q-2"]);
    }

    #[test]
    fn test_set_question() {
        let state = SessionState::new(10);
        let id = state.add_entry().unwrap();

        assert!(state.set_question(&id, "手打ち興行とは？"));
        assert_eq!(state.get_entry(&id).unwrap().question, "手打ち興行とは？");

        // 存在しないIDは false
        assert!(!state.set_question("q-999", "質問"));
    }

    #[test]
    fn test_mode_change_clears_results() {
        let state = SessionState::new(10);
        let id = state.add_entry().unwrap();

        state.update_entry(&id, |entry| {
            entry.answer = Some("回答".to_string());
            entry.evidence = Some("根拠".to_string());
            entry.error = Some("エラー".to_string());
            entry.answered_at = Some("2025-01-02T14:30:15+00:00".to_string());
        });

        assert!(state.set_mode(&id, QuestionMode::Llm));

        let entry = state.get_entry(&id).unwrap();
        assert_eq!(entry.mode, QuestionMode::Llm);
        assert!(entry.answer.is_none());
        assert!(entry.evidence.is_none());
        assert!(entry.error.is_none());
        assert!(entry.answered_at.is_none());
        // 質問文は残る
    }

    #[test]
    fn test_clear_results_keeps_questions() {
        let state = SessionState::new(10);
        let id = state.add_entry().unwrap();
        state.set_question(&id, "質問1");
        state.update_entry(&id, |entry| {
            entry.answer = Some("回答".to_string());
        });

        state.clear_results();

        let entry = state.get_entry(&id).unwrap();
        assert_eq!(entry.question, "質問1");
        assert!(entry.answer.is_none());
    }

    #[test]
    fn test_entry_json_serialization() {
        let state = SessionState::new(10);
        let id = state.add_entry().unwrap();
        state.set_question(&id, "質問");

        let entry = state.get_entry(&id).unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["id"], "q-0");
        assert_eq!(parsed["mode"], "transcription");
        assert_eq!(parsed["is_processing"], false);
        // None のフィールドは出力されない
        assert!(parsed.get("answer").is_none());
    }
}
