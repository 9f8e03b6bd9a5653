//! Edit-session flow across section forms, tool builder and route editor

use std::path::PathBuf;

use voice_console_config::load_catalog;
use voice_console_core::agent::{default_agent, LlmAgent, RouteResponse, ToolKind};
use voice_console_editor::{
    apply_patch, tool_template, AnalyticsPatch, ConfigDraft, FunctionsPatch, LlmPatch,
    RouteRuleForm, RoutesEditor, Section, SectionPatch, ToolBuilder,
};

fn catalog_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/providers.yaml")
}

#[test]
fn test_default_agent_cost_from_shipped_catalog() {
    let catalog = load_catalog(catalog_path()).unwrap();
    let draft = ConfigDraft::with_defaults("Support");
    let cost = draft.cost(&catalog);

    assert!((cost.llm - 0.00255).abs() < 1e-9);
    assert!((cost.transcriber - 0.0043).abs() < 1e-9);
    assert!((cost.synthesizer - 0.0135).abs() < 1e-9);
    assert!((cost.platform - 0.02).abs() < 1e-9);
    let sum = cost.llm + cost.transcriber + cost.synthesizer + cost.platform;
    assert!((cost.total - sum).abs() < 1e-12);
}

#[test]
fn test_sections_edit_one_draft() {
    let mut draft = ConfigDraft::with_defaults("Support");

    let mut tools = ToolBuilder::new();
    let (tool, params) = tool_template(ToolKind::TransferCall, None);
    let transfer = tool.name.clone();
    tools.add(tool, params).unwrap();
    let (tool, params) = tool_template(ToolKind::Custom, Some("lookup_order"));
    tools.add(tool, params).unwrap();
    draft
        .apply(&SectionPatch::Functions(FunctionsPatch {
            api_tools: tools.build(),
        }))
        .unwrap();

    let mut agent = LlmAgent::simple("anthropic", "claude-3-5-sonnet");
    let mut routes = RoutesEditor::from_agent(&agent);
    let mut form = RouteRuleForm::new("opening_hours");
    form.response = RouteResponse::Single("We are open from 9 to 5.".into());
    form.add_utterance("when are you open").unwrap();
    form.add_utterance("what are your hours").unwrap();
    routes.add(&form).unwrap();
    routes.apply_to(&mut agent).unwrap();
    draft
        .apply(&SectionPatch::Llm(LlmPatch {
            llm_agent: agent,
            system_prompt: Some("You are a store assistant.".into()),
        }))
        .unwrap();

    draft
        .apply(&SectionPatch::Analytics(AnalyticsPatch {
            summarization: Some("Summarize the call".into()),
            extraction: None,
            webhook_url: Some("https://hooks.example.com/calls".into()),
        }))
        .unwrap();

    let config = &draft.payload.agent_config;
    assert_eq!(config.tasks.len(), 2);
    let conversation = &config.tasks[0].tools_config;
    let api_tools = conversation.api_tools.as_ref().unwrap();
    assert_eq!(
        api_tools.names().collect::<Vec<_>>(),
        vec![transfer.as_str(), "lookup_order"]
    );
    assert_eq!(
        conversation.llm_agent.as_ref().and_then(|a| a.routes()).map(|r| r.routes.len()),
        Some(1)
    );
    assert_eq!(
        draft.payload.system_prompt(0),
        Some("You are a store assistant.")
    );
    assert_eq!(
        draft.selection.llm.as_ref().map(|s| s.model.as_str()),
        Some("claude-3-5-sonnet")
    );
    assert_eq!(
        draft.dirty.iter().copied().collect::<Vec<_>>(),
        vec![Section::Llm, Section::Functions, Section::Analytics]
    );

    // Reading a section back yields what was applied.
    match draft.section(Section::Functions) {
        Some(SectionPatch::Functions(patch)) => {
            assert_eq!(patch.api_tools.as_ref(), Some(api_tools))
        }
        other => panic!("unexpected section: {:?}", other),
    }
}

#[test]
fn test_deleting_a_tool_clears_params() {
    let payload = default_agent("Support");
    let mut tools = ToolBuilder::new();
    let (tool, params) = tool_template(ToolKind::BookAppointment, Some("book"));
    tools.add(tool, params).unwrap();
    let with_tool = apply_patch(
        &payload,
        &SectionPatch::Functions(FunctionsPatch {
            api_tools: tools.build(),
        }),
    )
    .unwrap();

    let mut tools = ToolBuilder::from_api_tools(
        with_tool.agent_config.tasks[0].tools_config.api_tools.as_ref(),
    );
    tools.delete("book").unwrap();
    let without = apply_patch(
        &with_tool,
        &SectionPatch::Functions(FunctionsPatch {
            api_tools: tools.build(),
        }),
    )
    .unwrap();

    assert!(without.agent_config.tasks[0].tools_config.api_tools.is_none());
    assert_eq!(
        without.agent_config.tasks[0].tools_config.synthesizer,
        payload.agent_config.tasks[0].tools_config.synthesizer
    );
}
