//! End-to-end tests of the pure pipeline:
//! catalog → score → select → compose → system prompt.

use mi_core::{
    EmptyContext, ManualSection, MemoryState, QUALITY_GATE, Scorer, SelectionPolicy, assemble,
    build_system_prompt, parse_catalog, render_memory_section, score, select,
};

const TOC: &str = "\
# Project Manuals

Pick manuals by keyword.

| Manual | File | Keywords |
|--------|------|----------|
| General Rules | general_rules.md | general, conventions |
| Security Rules | security_rules.md | auth, jwt, injection |
| Api Rules | api_rules.md | api, endpoint, middleware |
| React Rules | react_rules.md | react, component, hook |
| Database Rules | database_rules.md | sql, migration, query |
";

fn run(task: &str, hints: &[&str]) -> Vec<String> {
    let catalog = parse_catalog(TOC);
    let hints: Vec<String> = hints.iter().map(|h| h.to_string()).collect();
    select(
        &catalog.entries,
        task,
        &hints,
        &Scorer::default(),
        &SelectionPolicy::default(),
    )
    .into_iter()
    .map(|s| s.descriptor.name)
    .collect()
}

/// Reads every selected manual as `"<name> body"`.
fn sections_for(names: &[String]) -> Vec<ManualSection> {
    names
        .iter()
        .map(|name| ManualSection {
            name: name.clone(),
            content: format!("{name} body"),
        })
        .collect()
}

#[test]
fn jwt_task_selects_security_rules() {
    let catalog = parse_catalog(TOC);
    let security = catalog.find_by_file("security_rules.md").unwrap();
    assert!(score(security, "add jwt auth middleware", &[]) >= 4);

    let names = run("Add JWT auth middleware", &[]);
    assert!(names.contains(&"Security Rules".to_string()));
    // security: jwt + auth = 4, api: middleware = 2
    assert_eq!(names, vec!["Security Rules", "Api Rules"]);
}

#[test]
fn unmatched_task_falls_back_to_general_rules() {
    assert_eq!(run("refactor CSS spacing", &[]), vec!["General Rules"]);
}

#[test]
fn ties_follow_catalog_order() {
    // api_rules: endpoint (2) + path "api" (1) = 3
    // database_rules: query (2) + path "query" (1) = 3
    let names = run("endpoint query", &["src/api/query.ts"]);
    assert_eq!(names, vec!["Api Rules", "Database Rules"]);
}

#[test]
fn at_most_three_manuals() {
    let names = run("jwt api react sql conventions", &[]);
    assert_eq!(names.len(), 3);
}

#[test]
fn full_prompt_composition() {
    let names = run("Add JWT auth middleware", &["src/api/auth.ts"]);
    let context = assemble(sections_for(&names), Vec::new(), EmptyContext::Blank);
    assert_eq!(context.matched_names, names);

    let memory = MemoryState {
        plan: "Ship auth by Friday.".to_string(),
        ..MemoryState::default()
    };
    let prompt = build_system_prompt(&context.prompt_prefix, &render_memory_section(&memory));

    assert!(prompt.starts_with("You are a senior software engineer."));
    assert!(prompt.contains("# Injected Manuals"));
    assert!(prompt.contains("## Security Rules\n\nSecurity Rules body"));
    assert!(prompt.contains("Ship auth by Friday."));
    assert!(prompt.contains("_No context notes found._"));
    assert!(prompt.ends_with(QUALITY_GATE));
}

#[test]
fn empty_selection_renders_per_caller() {
    let catalog = parse_catalog("| Api | api.md | api |\n");
    let selected = select(
        &catalog.entries,
        "style tweak",
        &[],
        &Scorer::default(),
        &SelectionPolicy::default(),
    );
    assert!(selected.is_empty());

    let service = assemble(Vec::new(), Vec::new(), EmptyContext::Blank);
    let cli = assemble(Vec::new(), Vec::new(), EmptyContext::Sentinel);
    assert_eq!(service.prompt_prefix, "");
    assert_eq!(cli.prompt_prefix, "# No manuals matched for this task.");
    assert!(service.matched_names.is_empty() && cli.matched_names.is_empty());
}
