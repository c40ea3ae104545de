use dotenv::dotenv;
use statement_chat::{
    DataSource, FileStore, GeminiClient, PipelineConfig, StatementChat, StatementParserClient,
};
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Usage: `chat_with_statement "<data source>" <statement.pdf | parsed.json>`
///
/// PDFs go through the parser service at `STATEMENT_PARSER_URL`; a `.json`
/// file is treated as a body the parser already returned.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let source: DataSource = args
        .next()
        .ok_or("expected a data source, e.g. \"Eco Bank\"")?
        .parse()?;
    let file = PathBuf::from(args.next().ok_or("expected a statement file")?);

    println!("💬 Starting Statement Chat for {}...\n", source);

    let store = Arc::new(FileStore::open(".statement_chat/handles.json").await?);
    let api = Arc::new(GeminiClient::from_env()?);
    let config = PipelineConfig::default().with_export_dir(".statement_chat");
    let mut chat = StatementChat::new(config, store, api)?;

    let report = if file.extension().is_some_and(|ext| ext == "json") {
        let body: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
        chat.ingestor().ingest_response(source, &body).await
    } else {
        chat = chat.with_parser(StatementParserClient::from_env()?);
        let password = std::env::var("STATEMENT_PASSWORD").ok();
        chat.ingestor()
            .upload(source, &file, password.as_deref())
            .await
    };

    match report {
        Ok(report) => println!(
            "✅ Cached {} transactions ({} filler rows, ~{} tokens).\n",
            report.real_records, report.filler_records, report.estimated_tokens
        ),
        Err(e) => {
            eprintln!("❌ {}", e.user_message());
            eprintln!("   {}", e);
            return Ok(());
        }
    }

    println!("🤖 Ready! Ask questions about your statement (type 'quit' to exit).");
    println!("------------------------------------------------------------------");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let prompt = input.trim();

        if prompt.eq_ignore_ascii_case("quit") || prompt.eq_ignore_ascii_case("exit") {
            break;
        }

        if prompt.is_empty() {
            continue;
        }

        println!("\nThinking...");

        match chat.resolver().ask(source, prompt).await {
            Ok(response) => {
                println!("\n{}\n", response);
                println!("------------------------------------------------------------------");
            }
            Err(e) => {
                eprintln!("❌ {}", e.user_message());
            }
        }
    }

    Ok(())
}
