use std::fmt::Write;

use crawlwatch_core::{
    AppViewModel, BadgeTone, DetailView, NoticeLevel, ResourceRowView, Route, RowDisplay,
};

pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();
    if let Some(health) = &view.health {
        let marker = if health.healthy { "+" } else { "!" };
        let _ = writeln!(out, "[{marker}] {}", health.summary);
    }

    match view.route {
        Route::Login => out.push_str("Not logged in. Use 'login <api key>'.\n"),
        Route::Dashboard => render_dashboard(&mut out, view),
        Route::Detail(id) => match &view.detail {
            Some(detail) => render_detail(&mut out, detail),
            None => {
                let _ = writeln!(out, "URL #{id}: loading...");
            }
        },
    }

    if let Some(error) = &view.inline_error {
        let _ = writeln!(out, "error: {error}");
    }
    for notice in &view.notices {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "ERROR",
        };
        let _ = writeln!(out, "[{tag}] {}", notice.text);
    }
    out
}

fn render_dashboard(out: &mut String, view: &AppViewModel) {
    let filter = &view.filter;
    let _ = writeln!(
        out,
        "URLs: page {}/{} ({} total) status={} search={} sort={} {}",
        view.page.max(1),
        view.total_pages.max(1),
        view.total,
        filter.status.map_or("all", |status| status.as_str()),
        filter.search.as_deref().unwrap_or("-"),
        filter.sort_by.as_str(),
        filter.sort_order.as_str(),
    );
    if view.list_loading {
        out.push_str("  loading...\n");
    }
    if view.list_failed {
        out.push_str("  could not load URLs; use 'refresh' to retry\n");
    }
    for row in &view.rows {
        render_row(out, row);
    }
    if !view.selected.is_empty() {
        let _ = writeln!(
            out,
            "selected: {:?} (delete {}, rerun {})",
            view.selected,
            enabled(view.delete_enabled),
            enabled(view.rerun_enabled),
        );
    }
    if view.creating {
        out.push_str("adding URL...\n");
    }
}

fn render_row(out: &mut String, row: &ResourceRowView) {
    let mark = if row.selected {
        "[x]"
    } else if row.selectable {
        "[ ]"
    } else {
        " - "
    };
    let _ = writeln!(
        out,
        "{mark} {:>5}  {:<28} {:<40} {}",
        row.id,
        display_cell(&row.display),
        row.locator,
        row.title.as_deref().unwrap_or(""),
    );
}

fn render_detail(out: &mut String, detail: &DetailView) {
    let locator = detail
        .resource
        .as_ref()
        .map_or("", |resource| resource.locator.as_str());
    let _ = writeln!(out, "URL #{} {locator}", detail.id);
    if detail.loading {
        out.push_str("  loading...\n");
    }
    if detail.failed {
        out.push_str("  could not load this URL; use 'refresh' to retry\n");
    }
    if let Some(display) = &detail.display {
        let _ = writeln!(out, "  status: {}", display_cell(display));
    }
    if let Some(live) = &detail.live {
        if !live.message.is_empty() {
            let _ = writeln!(out, "  job: {}", live.message);
        }
    }

    match &detail.result {
        Some(_) if detail.result_empty => out.push_str("  no links or headings found\n"),
        Some(result) => {
            let _ = writeln!(
                out,
                "  title: {}\n  html: {}\n  headings h1-h6: {:?}\n  links: {} internal, {} external, {} broken{}",
                result.title.as_deref().unwrap_or("-"),
                result.html_version.as_deref().unwrap_or("-"),
                result.heading_counts(),
                result.internal_links,
                result.external_links,
                result.broken_links_count,
                if result.has_login_form { "\n  login form detected" } else { "" },
            );
        }
        None => out.push_str("  not analyzed yet\n"),
    }
    for link in &detail.broken_links {
        let _ = writeln!(out, "  broken: {} ({}) {}", link.locator, link.status_code, link.error_message);
    }
    let _ = writeln!(
        out,
        "  actions: start {}, stop {}, restart {}",
        enabled(detail.start_enabled),
        enabled(detail.stop_enabled),
        enabled(detail.restart_enabled),
    );
}

fn display_cell(display: &RowDisplay) -> String {
    match display {
        RowDisplay::Badge(badge) => {
            let marker = match badge.tone {
                BadgeTone::Neutral => ' ',
                BadgeTone::Busy => '~',
                BadgeTone::Success => '+',
                BadgeTone::Danger => '!',
            };
            format!("{marker}{}", badge.label)
        }
        RowDisplay::Progress { label, percent, .. } => format!("{label} {percent}%"),
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
