use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// 質問の処理モード
///
/// 各質問エントリがどのバックエンドで回答されるかを表す。
///
/// # Examples
///
/// ```
/// # use whisper_qa::types::QuestionMode;
/// let mode = QuestionMode::Transcription; // 文字起こし内の根拠検索
/// let mode = QuestionMode::Llm;           // LLMへの質問（シミュレート）
/// ```
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionMode {
    /// 文字起こしテキスト内の根拠検索
    Transcription,

    /// LLMへの質問（シミュレート）
    Llm,
}

/// 根拠検索結果の種別
///
/// 検索は必ずこの3種別のいずれか1つを返す。
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// 選択肢テンプレートに一致
    Template,

    /// 文単位の汎用一致
    Generic,

    /// 一致なし
    ///
    /// エラーではなく「見つからなかった」という正常な結果。
    NotFound,
}

/// 根拠検索の結果
///
/// 回答ラベルと、文字起こしから逐語的に引用した根拠文を保持する。
/// 根拠は常に元の表記（大文字小文字・句読点）のまま返される。
///
/// # JSON出力例
///
/// ```json
/// {
///   "kind": "template",
///   "answer": "選択肢 B が関連しているようです。",
///   "evidence": "「サーカスの収入源としては飲食やグッズ販売も重要になるんですね。」"
/// }
/// ```
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SearchResult {
    /// 一致の種別
    pub kind: MatchKind,

    /// 回答テキスト
    pub answer: String,

    /// 根拠となる引用文（一致なしの場合は空文字列）
    pub evidence: String,

    /// エラーメッセージ（予約フィールド、通常は None）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResult {
    /// テンプレート一致の結果を作成
    pub fn template(answer: String, evidence: String) -> Self {
        Self {
            kind: MatchKind::Template,
            answer,
            evidence,
            error: None,
        }
    }

    /// 文単位の汎用一致の結果を作成
    pub fn generic(answer: String, evidence: String) -> Self {
        Self {
            kind: MatchKind::Generic,
            answer,
            evidence,
            error: None,
        }
    }

    /// 一致なしの結果を作成
    ///
    /// 根拠は空文字列、エラーなし。
    pub fn not_found(answer: String) -> Self {
        Self {
            kind: MatchKind::NotFound,
            answer,
            evidence: String::new(),
            error: None,
        }
    }
}

/// LLMからの回答（シミュレート）
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct LlmAnswer {
    /// 回答テキスト
    pub answer: String,

    /// 詳細な解説
    pub explanation: String,

    /// エラーメッセージ（エラー時のみ Some）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 文字起こし結果
///
/// シミュレートされた文字起こしの全文とセグメント分割を保持する。
#[derive(Clone, Debug, Serialize)]
pub struct Transcript {
    /// 元の音声ファイル名
    pub source_file: String,

    /// 文字起こしの全文
    pub text: String,

    /// 文単位のセグメント
    pub segments: Vec<TranscriptSegment>,

    /// ISO 8601形式の生成時刻
    pub created_at: String,
}

/// 文字起こしのセグメント（1文）
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TranscriptSegment {
    /// セグメント番号（0始まり）
    pub id: usize,

    /// セグメントのテキスト
    pub text: String,
}

impl Transcript {
    /// 新しい文字起こし結果を作成
    ///
    /// 生成時刻は呼び出し時点の時刻が記録される。
    pub fn new(source_file: String, text: String, segments: Vec<TranscriptSegment>) -> Self {
        Self {
            source_file,
            text,
            segments,
            created_at: now_rfc3339(),
        }
    }
}

/// 現在時刻のISO 8601 (RFC 3339) タイムスタンプを生成
pub(crate) fn now_rfc3339() -> String {
    chrono::DateTime::from_timestamp(
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64,
        0,
    )
    .map(|dt| dt.to_rfc3339())
    .unwrap_or_default()
}
