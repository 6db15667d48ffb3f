use anyhow::{Context, Result};
use env_logger::Env;
use std::io::BufRead;
use std::sync::Arc;
use whisper_qa::config::Config;
use whisper_qa::processor::QuestionProcessor;
use whisper_qa::search::EvidenceSearcher;
use whisper_qa::session::SessionState;
use whisper_qa::stub_llm::StubLlm;
use whisper_qa::templates::TemplateTable;
use whisper_qa::transcribe::SimulatedTranscriber;
use whisper_qa::types::QuestionMode;
use whisper_qa::upload::{AcceptFilter, UploadedFile};

#[tokio::main]
async fn main() -> Result<()> {
    // ロガーを初期化
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    // コマンドライン引数をパース
    let args: Vec<String> = std::env::args().collect();

    // 設定ファイル生成モード
    if args.len() > 1 && args[1] == "--generate-config" {
        let config_path = if args.len() > 2 {
            &args[2]
        } else {
            "config.toml"
        };
        Config::write_default(config_path)?;
        println!("設定ファイルを生成しました: {}", config_path);
        return Ok(());
    }

    // テンプレートファイル生成モード
    if args.len() > 1 && args[1] == "--generate-templates" {
        let templates_path = if args.len() > 2 {
            &args[2]
        } else {
            "templates.toml"
        };
        TemplateTable::write_builtin(templates_path)?;
        println!("テンプレートファイルを生成しました: {}", templates_path);
        return Ok(());
    }

    let mut config_path = "config.toml".to_string();
    let mut audio_path: Option<String> = None;
    let mut questions_path: Option<String> = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--file" => audio_path = iter.next().cloned(),
            "--questions" => questions_path = iter.next().cloned(),
            _ if !arg.starts_with("--") => config_path = arg.clone(),
            _ => anyhow::bail!("不明なオプション: {}", arg),
        }
    }
    let audio_path = audio_path
        .context("音声ファイルを --file <パス> で指定してください")?;

    // 設定を読み込み
    let config = Config::load_or_default(&config_path)?;

    log::info!("whisper-qa を起動します");
    log::info!("設定: {:?}", config);

    // テンプレートテーブルを読み込み
    let table = match &config.templates {
        Some(templates) => TemplateTable::from_file(&templates.path)?,
        None => TemplateTable::builtin(),
    };
    log::info!("テンプレートテーブル: {}件", table.len());

    // ファイル形式を検証
    let filter = AcceptFilter::parse(
        &config.upload.accepted_types,
        Some(&config.upload.display_types),
    );
    let file = UploadedFile::from_path(&audio_path);
    filter.validate(&file)?;

    // 文字起こしをシミュレート
    let transcriber = SimulatedTranscriber::new(&config.transcribe, table.clone());
    let transcript = transcriber.transcribe(&file).await?;

    // 質問を読み込み（1行1問、"llm:" 接頭辞でLLMモード）
    let lines: Vec<String> = match &questions_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("質問ファイルの読み込みに失敗: {}", path))?
            .lines()
            .map(str::to_string)
            .collect(),
        None => {
            log::info!("標準入力から質問を読み込みます (1行1問, \"llm:\" 接頭辞でLLMモード)");
            std::io::stdin()
                .lock()
                .lines()
                .collect::<std::io::Result<Vec<String>>>()
                .context("標準入力の読み込みに失敗")?
        }
    };

    // セッションを構築
    let state = SessionState::new(config.session.max_questions);
    let searcher = EvidenceSearcher::new(table, &config.search)?;
    let llm = Arc::new(StubLlm::new(&config.llm));
    let mut processor = QuestionProcessor::new(state.clone(), searcher, llm);
    processor.set_transcript(transcript);

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (mode, question) = match line.strip_prefix("llm:") {
            Some(rest) => (QuestionMode::Llm, rest.trim()),
            None => (QuestionMode::Transcription, line),
        };
        match state.add_entry() {
            Some(id) => {
                state.set_question(&id, question);
                state.set_mode(&id, mode);
            }
            None => {
                log::warn!(
                    "質問数の上限 ({}件) を超えたため無視します: {}",
                    config.session.max_questions,
                    question
                );
            }
        }
    }

    if state.is_empty() {
        anyhow::bail!("処理する質問がありません。質問を入力してください。");
    }

    // 全質問を並行処理して結果をJSONで出力
    processor.process_all().await;

    for entry in processor.state().entries() {
        println!("{}", serde_json::to_string(&entry)?);
    }

    Ok(())
}
