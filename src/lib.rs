//! whisper-qa - 文字起こしベースの質問応答システム
//!
//! このクレートは、音声ファイルの（シミュレートされた）文字起こしに対して
//! 質問を行い、文字起こしテキスト内の根拠検索、または（シミュレートされた）
//! LLM呼び出しで回答を得るシステムを提供します。
//!
//! # 主な機能
//!
//! - **根拠検索**: 選択肢テンプレート照合と文単位の汎用照合による3段階の検索。
//!   回答には文字起こしからの逐語的な引用（根拠）が付く
//! - **LLM回答（スタブ）**: 固定の回答・解説を返すプレースホルダ実装
//! - **質問セッション管理**: 上限付きの質問リストを並行処理。1件の失敗は
//!   他の質問に影響しない
//! - **ファイル形式検証**: メディアタイプと拡張子の許可リスト照合
//!
//! # アーキテクチャ
//!
//! ```text
//! [UploadedFile] → [AcceptFilter] → [SimulatedTranscriber]
//!                                          ↓
//!                                     [Transcript]
//!                                          ↓
//! [SessionState] ← [QuestionProcessor] ─┬→ [EvidenceSearcher]
//!                                        └→ [LlmBackend (StubLlm)]
//! ```
//!
//! # 使用例
//!
//! ```no_run
//! use whisper_qa::config::Config;
//!
//! // 設定ファイルを読み込み
//! let config = Config::load_or_default("config.toml").unwrap();
//!
//! // またはデフォルト設定を生成
//! Config::write_default("config.toml").unwrap();
//! ```

pub mod config;
pub mod llm_backend;
pub mod processor;
pub mod search;
pub mod session;
pub mod stub_llm;
pub mod templates;
pub mod transcribe;
pub mod types;
pub mod upload;
