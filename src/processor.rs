use crate::llm_backend::LlmBackend;
use crate::search::EvidenceSearcher;
use crate::session::SessionState;
use crate::types::{now_rfc3339, QuestionMode, Transcript};
use futures_util::future::join_all;
use std::sync::Arc;

/// 予期しない処理失敗時にエントリへ格納するメッセージ
const UNEXPECTED_ERROR_MESSAGE: &str = "検索中に予期せぬエラーが発生しました。";

/// 1件の質問処理の結果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// 処理完了（結果はエントリに格納済み。エラー応答も含む）
    Completed,

    /// 質問が未入力
    EmptyQuestion,

    /// 文字起こしがまだない（文字起こし検索モードのみ）
    TranscriptMissing,

    /// 該当するエントリがない
    UnknownEntry,
}

/// 質問エントリの処理を統括する
///
/// 各エントリをモードに応じて根拠検索またはLLMバックエンドに
/// 振り分け、結果をエントリに書き戻す。1件の処理中の失敗は
/// そのエントリ内に閉じ込め、他のエントリには影響させない。
pub struct QuestionProcessor {
    state: SessionState,
    searcher: EvidenceSearcher,
    llm: Arc<dyn LlmBackend>,
    transcript: Option<Transcript>,
}

impl QuestionProcessor {
    pub fn new(state: SessionState, searcher: EvidenceSearcher, llm: Arc<dyn LlmBackend>) -> Self {
        Self {
            state,
            searcher,
            llm,
            transcript: None,
        }
    }

    /// セッション状態への参照を取得
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// 文字起こし結果を設定
    ///
    /// 新しい文字起こしが来ると過去の回答は無効になるため、
    /// 全エントリの結果フィールドをクリアする。
    pub fn set_transcript(&mut self, transcript: Transcript) {
        self.state.clear_results();
        self.transcript = Some(transcript);
    }

    /// 現在の文字起こし結果を取得
    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    /// 1件の質問を処理
    ///
    /// 結果（エラー応答を含む）はエントリに書き戻される。
    /// 予期しない失敗は汎用エラーメッセージに変換してエントリに
    /// 格納し、呼び出し元へは伝播しない。
    pub async fn process_one(&self, id: &str) -> ProcessOutcome {
        let Some(entry) = self.state.get_entry(id) else {
            log::warn!("不明なエントリID: {}", id);
            return ProcessOutcome::UnknownEntry;
        };

        if entry.question.trim().is_empty() {
            log::warn!("質問 {} が未入力のためスキップします", id);
            return ProcessOutcome::EmptyQuestion;
        }

        match entry.mode {
            QuestionMode::Transcription => {
                let Some(transcript) = self.transcript.as_ref() else {
                    log::warn!("文字起こしがまだないため質問 {} をスキップします", id);
                    return ProcessOutcome::TranscriptMissing;
                };

                self.begin(id);
                log::info!(
                    "質問 {} の処理中 (文字起こし検索): \"{}\"",
                    id,
                    entry.question
                );
                match self.searcher.search(&transcript.text, &entry.question).await {
                    Ok(result) => {
                        self.state.update_entry(id, |e| {
                            e.answer = Some(result.answer);
                            e.evidence = Some(result.evidence);
                            e.error = result.error;
                            e.answered_at = Some(now_rfc3339());
                            e.is_processing = false;
                        });
                    }
                    Err(e) => self.fail(id, e),
                }
            }
            QuestionMode::Llm => {
                self.begin(id);
                log::info!("質問 {} の処理中 (LLM質問): \"{}\"", id, entry.question);
                match self.llm.ask(&entry.question).await {
                    Ok(result) => {
                        self.state.update_entry(id, |e| {
                            e.answer = Some(result.answer);
                            e.explanation = Some(result.explanation);
                            e.error = result.error;
                            e.answered_at = Some(now_rfc3339());
                            e.is_processing = false;
                        });
                    }
                    Err(e) => self.fail(id, e),
                }
            }
        }

        log::info!("質問 {} の処理が完了しました", id);
        ProcessOutcome::Completed
    }

    /// 全エントリを並行処理
    ///
    /// 各エントリの処理は独立した非同期ユニットとして同時に起動し、
    /// 全件が決着（成功・失敗・スキップ）するまで待つ。1件の失敗が
    /// 他のエントリをキャンセルしたりブロックしたりすることはない。
    pub async fn process_all(&self) -> Vec<(String, ProcessOutcome)> {
        let ids: Vec<String> = self
            .state
            .entries()
            .into_iter()
            .map(|entry| entry.id)
            .collect();

        let units = ids.iter().map(|id| self.process_one(id));
        let outcomes = join_all(units).await;

        let results: Vec<(String, ProcessOutcome)> = ids.into_iter().zip(outcomes).collect();
        let completed = results
            .iter()
            .filter(|(_, outcome)| *outcome == ProcessOutcome::Completed)
            .count();
        log::info!(
            "全ての質問の処理が完了しました ({}/{}件)",
            completed,
            results.len()
        );
        results
    }

    /// 処理開始: 処理中フラグを立て、以前の結果をクリア
    fn begin(&self, id: &str) {
        self.state.update_entry(id, |entry| {
            entry.is_processing = true;
            entry.clear_result();
        });
    }

    /// 予期しない失敗をエントリ内に閉じ込める
    fn fail(&self, id: &str, error: anyhow::Error) {
        log::error!("質問処理中にエラーが発生しました: {:#}", error);
        self.state.update_entry(id, |entry| {
            entry.error = Some(UNEXPECTED_ERROR_MESSAGE.to_string());
            entry.is_processing = false;
        });
    }
}
