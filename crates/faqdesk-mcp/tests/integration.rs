use std::fs;
use std::sync::Arc;

use faqdesk_backlog::{BacklogService, DeskDb};
use faqdesk_core::{FaqConfig, KnowledgeConfig};
use faqdesk_kb::KnowledgeStore;
use faqdesk_mcp::tools::{AnswerFaqParams, FaqServer, ListBacklogParams};
use faqdesk_mcp::FaqDesk;
use rmcp::{handler::server::wrapper::Parameters, model::*, ServerHandler};

struct Fixture {
    dir: tempfile::TempDir,
    server: FaqServer,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("account_management.txt"),
        "Q: How do I reset my password?\nA: Use the Forgot Password link on the sign-in page.\n\n\
         Q: How do I delete my account?\nA: Go to Settings > Account > Delete.\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("device_setup.txt"),
        "Q: How do I pair my watch with my phone?\nA: Open the app and tap Add Device.\n",
    )
    .unwrap();

    let config = FaqConfig {
        knowledge: KnowledgeConfig {
            directory: dir.path().to_path_buf(),
            ..KnowledgeConfig::default()
        },
        ..FaqConfig::default()
    };
    let desk = FaqDesk::new(
        &config,
        Arc::new(KnowledgeStore::open(config.knowledge.clone()).unwrap()),
        Arc::new(BacklogService::new(
            DeskDb::in_memory().unwrap(),
            &config.backlog,
        )),
    );
    Fixture {
        dir,
        server: FaqServer::new(Arc::new(desk)),
    }
}

fn extract_text(result: &CallToolResult) -> &str {
    match &result.content[0].raw {
        RawContent::Text(t) => &t.text,
        _ => panic!("expected text content"),
    }
}

fn parse(result: &CallToolResult) -> serde_json::Value {
    serde_json::from_str(extract_text(result)).unwrap()
}

async fn ask(server: &FaqServer, query: &str) -> serde_json::Value {
    let params = Parameters(AnswerFaqParams {
        query: query.to_string(),
    });
    parse(&server.answer_faq(params).await.unwrap())
}

#[test]
fn server_info_is_correct() {
    let fx = fixture();
    let info = fx.server.get_info();

    assert_eq!(info.server_info.name, "faqdesk");
    assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
    let instructions = info.instructions.unwrap();
    for tool in [
        "answer_faq",
        "list_faq_files",
        "reload_faq_content",
        "get_analytics_summary",
        "list_backlog",
    ] {
        assert!(instructions.contains(tool), "instructions should mention {tool}");
    }
}

#[tokio::test]
async fn answer_faq_success() {
    let fx = fixture();
    let parsed = ask(&fx.server, "How do I reset my password?").await;
    assert_eq!(parsed["status"], "success");
    assert_eq!(parsed["sourceFile"], "account_management.txt");
    assert_eq!(
        parsed["answer"],
        "Use the Forgot Password link on the sign-in page."
    );
    assert_eq!(parsed["relevance"], "high");
    assert!(parsed["score"].as_f64().unwrap() > 0.8);
}

#[tokio::test]
async fn answer_faq_picks_entry_within_file() {
    let fx = fixture();
    let parsed = ask(&fx.server, "delete my account").await;
    assert_eq!(parsed["status"], "success");
    assert_eq!(parsed["answer"], "Go to Settings > Account > Delete.");
}

#[tokio::test]
async fn answer_faq_no_answer_records_backlog() {
    let fx = fixture();
    let first = ask(&fx.server, "Do you have a referral programme?").await;
    assert_eq!(first["status"], "no_answer");
    assert_eq!(first["backlog"]["merged"], false);
    assert!(first["reasoning"]
        .as_str()
        .unwrap()
        .contains("required minimum is 0.5"));

    let second = ask(&fx.server, "do you have a referral programme").await;
    assert_eq!(second["backlog"]["merged"], true);
    assert_eq!(second["backlog"]["frequency"], 2);
    assert_eq!(second["backlog"]["id"], first["backlog"]["id"]);

    let backlog = parse(
        &fx.server
            .list_backlog(Parameters(ListBacklogParams {
                status: Some("pending".into()),
                limit: None,
            }))
            .await
            .unwrap(),
    );
    assert_eq!(backlog["total"], 1);
    assert_eq!(backlog["items"][0]["frequency"], 2);
    assert_eq!(backlog["items"][0]["status"], "pending");
}

#[tokio::test]
async fn answer_faq_empty_query_is_invalid_params() {
    let fx = fixture();
    let err = fx
        .server
        .answer_faq(Parameters(AnswerFaqParams {
            query: "   ".into(),
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    assert!(err.message.contains("query cannot be empty"));
}

#[tokio::test]
async fn list_backlog_rejects_unknown_status() {
    let fx = fixture();
    let err = fx
        .server
        .list_backlog(Parameters(ListBacklogParams {
            status: Some("closed".into()),
            limit: None,
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
}

#[test]
fn list_faq_files_reports_counts() {
    let fx = fixture();
    let parsed = parse(&fx.server.list_faq_files().unwrap());
    assert_eq!(parsed["totalFiles"], 2);
    assert_eq!(parsed["totalQaPairs"], 3);
    assert_eq!(parsed["files"][0]["filename"], "account_management.txt");
    assert_eq!(parsed["files"][0]["qaCount"], 2);
    assert_eq!(parsed["files"][1]["category"], "Device Setup");
    assert!(parsed.get("lastLoaded").is_some());
}

#[tokio::test]
async fn reload_faq_content_picks_up_new_files() {
    let fx = fixture();
    fs::write(
        fx.dir.path().join("shipping.txt"),
        "Q: How long does delivery take?\nA: Two to four working days.\n",
    )
    .unwrap();

    let parsed = parse(&fx.server.reload_faq_content().await.unwrap());
    assert_eq!(parsed["filesLoaded"], 3);
    assert_eq!(parsed["filesChanged"], 1);
    assert!(parsed["message"].as_str().unwrap().contains("3 FAQ file"));
    assert!(parsed.get("reloadTime").is_some());

    let answered = ask(&fx.server, "how long does delivery take").await;
    assert_eq!(answered["sourceFile"], "shipping.txt");
}

#[tokio::test]
async fn get_analytics_summary_tracks_outcomes() {
    let fx = fixture();
    ask(&fx.server, "How do I pair my watch with my phone?").await;
    ask(&fx.server, "Is there a dark mode?").await;

    let parsed = parse(&fx.server.get_analytics_summary().await.unwrap());
    assert_eq!(parsed["totalInteractions"], 2);
    assert_eq!(parsed["successfulInteractions"], 1);
    assert_eq!(parsed["successRate"], 50.0);
    assert_eq!(parsed["pendingQuestions"], 1);
}
