//! Code-level smell detection (§4.6). Each smell contributes a paired
//! `possibleIssues`/`suggestedFixes` bullet.

#[derive(Debug, Clone, Copy)]
pub struct Smell {
    pub issue: &'static str,
    pub fix: &'static str,
}

const DOM_SELECTOR_WITHOUT_EXTRACT: Smell = Smell {
    issue: "Uses DOM selectors (querySelector/querySelectorAll) without ever calling the AI-extract primitive.",
    fix: "Prefer `page.extract(instruction, schema)` for pulling structured session data; reserve DOM \
selectors for narrow, stable hooks like pagination controls.",
};

const NON_IDLE_WAIT_WITHOUT_SLEEP: Smell = Smell {
    issue: "Navigates with a non-network-idle wait condition and no explicit post-load sleep.",
    fix: "Wait for network idle on navigation and add an explicit short sleep afterward so client-side \
rendering has time to settle before extraction.",
};

const PAGINATION_PARAM_WITHOUT_LOOP: Smell = Smell {
    issue: "References pagination query parameters (page, offset, limit) but never loops over pages.",
    fix: "Iterate the pagination parameter until a page returns no new sessions, accumulating results \
across pages.",
};

fn uses_dom_selector_without_extract(code: &str) -> bool {
    let uses_selector = code.contains("querySelector(") || code.contains("querySelectorAll(");
    let uses_extract = code.contains(".extract(");
    uses_selector && !uses_extract
}

fn uses_non_idle_wait_without_sleep(code: &str) -> bool {
    let navigates = code.contains(".goto(");
    let waits_for_idle = code.contains("networkidle") || code.contains("NetworkIdle") || code.contains("waitUntil: \"networkidle");
    let has_explicit_sleep = code.contains("waitForTimeout(") || code.contains("sleep(");
    navigates && !waits_for_idle && !has_explicit_sleep
}

fn references_pagination_without_loop(code: &str) -> bool {
    let references_param = code.contains("page=") || code.contains("offset=") || code.contains("\"page\"") || code.contains("'page'");
    let has_loop = code.contains("for (") || code.contains("while (") || code.contains(".map(") || code.contains("for(");
    references_param && !has_loop
}

/// Every smell the generated code exhibits, in a fixed check order.
pub fn detect_smells(code: &str) -> Vec<Smell> {
    let mut found = Vec::new();
    if uses_dom_selector_without_extract(code) {
        found.push(DOM_SELECTOR_WITHOUT_EXTRACT);
    }
    if uses_non_idle_wait_without_sleep(code) {
        found.push(NON_IDLE_WAIT_WITHOUT_SLEEP);
    }
    if references_pagination_without_loop(code) {
        found.push(PAGINATION_PARAM_WITHOUT_LOOP);
    }
    found
}
