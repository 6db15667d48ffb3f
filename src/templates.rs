use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 選択肢テンプレート
///
/// (キーフレーズ, ラベル, 完全文) の3つ組。
/// 根拠検索はこのテーブルを最優先で照合する。
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct OptionTemplate {
    /// 文字起こし内で探すキーフレーズ
    pub key: String,

    /// 選択肢ラベル（"A" など）
    pub label: String,

    /// 根拠として返す完全な文
    ///
    /// 鉤括弧を含む元の表記のまま返される。
    pub sentence: String,
}

/// 選択肢テンプレートのテーブル
///
/// 起動時に一度だけ読み込まれる不変テーブル。
/// 定義順がそのまま照合順になり、最初に条件を満たしたテンプレートが
/// 採用されるため、重複しうるテンプレートは意図的に並べること。
///
/// # TOML形式
///
/// ```toml
/// [[templates]]
/// key = "演劇の興行期間は通常、数日間に限定されます。"
/// label = "D"
/// sentence = "「演劇の興行期間は通常、数日間に限定されます。」"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TemplateTable {
    #[serde(default)]
    templates: Vec<OptionTemplate>,
}

impl TemplateTable {
    /// テンプレート一覧からテーブルを作成
    pub fn new(templates: Vec<OptionTemplate>) -> Self {
        Self { templates }
    }

    /// 組み込みのテンプレートテーブル
    ///
    /// 興行ビジネス講義の4択問題に対応した選択肢 A〜D。
    pub fn builtin() -> Self {
        Self::new(vec![
            OptionTemplate {
                key: "ライブ配信の著作権使用料はテレビ放送よりも低く設定されているわけですよ。"
                    .to_string(),
                label: "A".to_string(),
                sentence:
                    "「ライブ配信の著作権使用料はテレビ放送よりも低く設定されているわけですよ。」"
                        .to_string(),
            },
            OptionTemplate {
                key: "サーカスの収入源としては飲食やグッズ販売も重要になるんですね。".to_string(),
                label: "B".to_string(),
                sentence: "「サーカスの収入源としては飲食やグッズ販売も重要になるんですね。」"
                    .to_string(),
            },
            OptionTemplate {
                key: "ライブハウスは基本的に飲食店とは法的に全く関係がないということになります。"
                    .to_string(),
                label: "C".to_string(),
                sentence:
                    "「ライブハウスは基本的に飲食店とは法的に全く関係がないということになります。」"
                        .to_string(),
            },
            OptionTemplate {
                key: "演劇の興行期間は通常、数日間に限定されます。".to_string(),
                label: "D".to_string(),
                sentence: "「演劇の興行期間は通常、数日間に限定されます。」".to_string(),
            },
        ])
    }

    /// テンプレートファイルから読み込み
    ///
    /// TOML形式のテンプレートファイルをパースしてテーブルを生成する。
    /// ファイル内の記述順が照合順になる。
    ///
    /// # Errors
    ///
    /// ファイルの読み込みまたはパースに失敗した場合にエラーを返す。
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("テンプレートファイルの読み込みに失敗: {:?}", path.as_ref()))?;
        let table: TemplateTable =
            toml::from_str(&content).with_context(|| "テンプレートファイルのパースに失敗")?;
        Ok(table)
    }

    /// 組み込みテーブルをファイルに書き出し
    ///
    /// 代替テーブルを作成する際の雛形として使う。
    /// 既存のファイルは上書きされる。
    ///
    /// # Errors
    ///
    /// ファイルの書き込みに失敗した場合にエラーを返す。
    pub fn write_builtin<P: AsRef<Path>>(path: P) -> Result<()> {
        let table = TemplateTable::builtin();
        let content =
            toml::to_string_pretty(&table).with_context(|| "テンプレートのシリアライズに失敗")?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("テンプレートファイルの書き込みに失敗: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// テンプレートを定義順に走査
    pub fn iter(&self) -> impl Iterator<Item = &OptionTemplate> {
        self.templates.iter()
    }

    /// テンプレート数
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// テーブルが空かどうか
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
