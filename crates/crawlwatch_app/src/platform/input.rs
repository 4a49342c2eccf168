//! Command-line input parsing. One line of user input becomes at most one
//! [`Msg`].

use crawlwatch_core::{
    FilterPatch, Msg, ResourceId, ResourceStatus, SortField, SortOrder,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Msg(Msg),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  login <key> | logout
  list | open <id> | close | refresh
  page <n> | size <n> | status <queued|running|completed|error|all>
  search [text] | sort <field> [asc|desc] | reset
  select <id>|all | clear
  add <url>
  start <id> | stop <id>... | restart <id>... | rerun | delete
  dismiss | help | quit";

pub fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    if word.is_empty() {
        return Ok(None);
    }

    let msg = match word.to_ascii_lowercase().as_str() {
        "help" | "?" => return Ok(Some(Input::Help)),
        "quit" | "exit" | "q" => return Ok(Some(Input::Quit)),
        "login" => Msg::LoggedIn {
            api_key: rest.to_string(),
        },
        "logout" => Msg::LoggedOut,
        "list" | "dashboard" => Msg::DashboardOpened,
        "open" => Msg::DetailOpened { id: parse_id(rest)? },
        "close" | "back" => Msg::DetailClosed,
        "refresh" | "r" => Msg::RefreshClicked,
        "page" => Msg::FiltersChanged(FilterPatch::page(parse_number(rest, "page")?)),
        "size" => Msg::FiltersChanged(FilterPatch {
            page_size: Some(parse_number(rest, "page size")?),
            ..FilterPatch::default()
        }),
        "status" => Msg::FiltersChanged(FilterPatch::status(parse_status(rest)?)),
        "search" => Msg::FiltersChanged(FilterPatch::search(
            Some(rest.to_string()).filter(|text| !text.is_empty()),
        )),
        "sort" => {
            let (field, order) = parse_sort(rest)?;
            Msg::FiltersChanged(FilterPatch::sort(field, order))
        }
        "reset" => Msg::FiltersReset,
        "select" if rest.eq_ignore_ascii_case("all") => Msg::SelectAllOnPage,
        "select" => Msg::SelectionToggled { id: parse_id(rest)? },
        "clear" => Msg::SelectionCleared,
        "add" => Msg::UrlSubmitted(rest.to_string()),
        "start" => Msg::StartClicked { id: parse_id(rest)? },
        "stop" => Msg::StopClicked {
            ids: parse_ids(rest)?,
        },
        "restart" => Msg::RestartClicked {
            ids: parse_ids(rest)?,
        },
        "rerun" => Msg::RerunSelectedClicked,
        "delete" => Msg::DeleteSelectedClicked,
        "dismiss" => Msg::NoticesDismissed,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(Input::Msg(msg)))
}

fn parse_id(raw: &str) -> Result<ResourceId, String> {
    raw.parse()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| format!("'{raw}' is not a URL id"))
}

fn parse_ids(raw: &str) -> Result<Vec<ResourceId>, String> {
    let ids = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(parse_id)
        .collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Err("expected at least one URL id".to_string());
    }
    Ok(ids)
}

fn parse_number(raw: &str, what: &str) -> Result<u32, String> {
    raw.parse()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("'{raw}' is not a valid {what}"))
}

fn parse_status(raw: &str) -> Result<Option<ResourceStatus>, String> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    ResourceStatus::parse(raw)
        .map(Some)
        .ok_or_else(|| format!("unknown status '{raw}'"))
}

fn parse_sort(raw: &str) -> Result<(SortField, SortOrder), String> {
    let mut parts = raw.split_whitespace();
    let field = parts.next().unwrap_or_default();
    let field = SortField::parse(field).ok_or_else(|| format!("unknown sort field '{field}'"))?;
    let order = match parts.next() {
        Some(order) => SortOrder::parse(order).ok_or_else(|| format!("unknown order '{order}'"))?,
        None => SortOrder::Asc,
    };
    Ok((field, order))
}
