use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub transcribe: TranscribeConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// 代替テンプレートテーブルの設定（省略時は組み込みテーブル）
    pub templates: Option<TemplatesConfig>,
}

/// アップロード設定
///
/// 受け入れるファイル形式の許可リスト。
///
/// # デフォルト値
///
/// - `accepted_types`: "audio/*,.wav,.mp3,.m4a,.ogg,.flac"
/// - `display_types`: "音声ファイル (.wav, .mp3, .m4a など)"
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    #[serde(default = "default_accepted_types")]
    pub accepted_types: String,
    #[serde(default = "default_display_types")]
    pub display_types: String,
}

/// 根拠検索設定
///
/// # デフォルト値
///
/// - `delay_ms`: 500 ms（リモート検索バックエンドを想定した擬似遅延）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_delay_ms")]
    pub delay_ms: u64,
}

/// LLM回答設定
///
/// # デフォルト値
///
/// - `delay_ms`: 1500 ms（API呼び出しを想定した擬似遅延）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_delay_ms")]
    pub delay_ms: u64,
}

/// 文字起こしシミュレーション設定
///
/// # デフォルト値
///
/// - `delay_ms`: 2000 ms
/// - `language`: "ja" (日本語)
/// - `repeat_count`: 3 (ダミーテキストの繰り返し回数)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscribeConfig {
    #[serde(default = "default_transcribe_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_repeat_count")]
    pub repeat_count: usize,
}

/// 質問セッション設定
///
/// # デフォルト値
///
/// - `max_questions`: 10 件
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
}

/// 出力設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// 代替テンプレートテーブルの設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplatesConfig {
    /// テンプレートファイル (TOML) のパス
    pub path: String,
}

// Default functions
fn default_accepted_types() -> String {
    "audio/*,.wav,.mp3,.m4a,.ogg,.flac".to_string()
}

fn default_display_types() -> String {
    "音声ファイル (.wav, .mp3, .m4a など)".to_string()
}

fn default_search_delay_ms() -> u64 {
    500
}

fn default_llm_delay_ms() -> u64 {
    1500
}

fn default_transcribe_delay_ms() -> u64 {
    2000
}

fn default_language() -> String {
    "ja".to_string()
}

fn default_repeat_count() -> usize {
    3
}

fn default_max_questions() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload: UploadConfig::default(),
            search: SearchConfig::default(),
            llm: LlmConfig::default(),
            transcribe: TranscribeConfig::default(),
            session: SessionConfig::default(),
            output: OutputConfig::default(),
            templates: None, // デフォルトでは組み込みテーブルを使用
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            accepted_types: default_accepted_types(),
            display_types: default_display_types(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_search_delay_ms(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_llm_delay_ms(),
        }
    }
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_transcribe_delay_ms(),
            language: default_language(),
            repeat_count: default_repeat_count(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_questions: default_max_questions(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// 設定ファイルから読み込み
    ///
    /// TOML形式の設定ファイルをパースしてConfig構造体を生成する。
    ///
    /// # Arguments
    ///
    /// * `path` - 設定ファイルのパス
    ///
    /// # Errors
    ///
    /// ファイルの読み込みまたはパースに失敗した場合にエラーを返す。
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use whisper_qa::config::Config;
    /// let config = Config::from_file("config.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("設定ファイルの読み込みに失敗: {:?}", path.as_ref()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "設定ファイルのパースに失敗")?;
        Ok(config)
    }

    /// デフォルト設定をファイルに書き出し
    ///
    /// デフォルト値を持つ設定ファイルを生成する。
    /// 既存のファイルは上書きされる。
    ///
    /// # Errors
    ///
    /// ファイルの書き込みに失敗した場合にエラーを返す。
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Config::default();
        let content =
            toml::to_string_pretty(&config).with_context(|| "設定のシリアライズに失敗")?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("設定ファイルの書き込みに失敗: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// 設定ファイルがあれば読み込み、なければデフォルトを使用
    ///
    /// # Errors
    ///
    /// ファイルが存在するがパースに失敗した場合にエラーを返す。
    /// ファイルが存在しない場合はエラーにならず、デフォルト設定を返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            log::warn!(
                "設定ファイルが見つかりません。デフォルト設定を使用します: {:?}",
                path.as_ref()
            );
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.delay_ms, 500);
        assert_eq!(config.llm.delay_ms, 1500);
        assert_eq!(config.transcribe.delay_ms, 2000);
        assert_eq!(config.transcribe.language, "ja");
        assert_eq!(config.session.max_questions, 10);
        assert!(config.upload.accepted_types.contains("audio/*"));
        assert!(config.templates.is_none());
    }

    #[test]
    fn test_write_and_read_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        // デフォルト設定を書き込み
        Config::write_default(path).unwrap();

        // 読み込み
        let config = Config::from_file(path).unwrap();
        assert_eq!(config.search.delay_ms, 500);
        assert_eq!(config.session.max_questions, 10);
    }

    #[test]
    fn test_custom_config() {
        let toml_content = r#"
[upload]
accepted_types = "audio/wav,.wav"
display_types = "WAVファイル"

[search]
delay_ms = 100

[llm]
delay_ms = 200

[transcribe]
delay_ms = 300
language = "en"
repeat_count = 1

[session]
max_questions = 5

[output]
log_level = "debug"

[templates]
path = "custom_templates.toml"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.upload.accepted_types, "audio/wav,.wav");
        assert_eq!(config.upload.display_types, "WAVファイル");
        assert_eq!(config.search.delay_ms, 100);
        assert_eq!(config.llm.delay_ms, 200);
        assert_eq!(config.transcribe.delay_ms, 300);
        assert_eq!(config.transcribe.language, "en");
        assert_eq!(config.transcribe.repeat_count, 1);
        assert_eq!(config.session.max_questions, 5);
        assert_eq!(config.output.log_level, "debug");
        assert_eq!(config.templates.unwrap().path, "custom_templates.toml");
    }

    #[test]
    fn test_load_or_default_nonexistent() {
        let config = Config::load_or_default("nonexistent_file.toml").unwrap();
        // デフォルト設定が返されることを確認
        assert_eq!(config.search.delay_ms, 500);
    }

    #[test]
    fn test_partial_config() {
        // 一部の設定のみ記述した場合、残りはデフォルト値が使われる
        let toml_content = r#"
[session]
max_questions = 3
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        // 指定した値
        assert_eq!(config.session.max_questions, 3);

        // デフォルト値
        assert_eq!(config.search.delay_ms, 500);
        assert_eq!(config.transcribe.language, "ja");
    }
}
