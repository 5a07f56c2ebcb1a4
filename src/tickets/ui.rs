//! Server-rendered pages for the ticket flow: the multi-step submission
//! form, the streamed solution page, and the not-found state.

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::shared::state::AppState;
use crate::tickets::error::TicketError;
use crate::tickets::Ticket;

#[derive(Debug, Deserialize)]
pub struct SolutionQuery {
    pub id: Option<String>,
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn render_empty_state(icon: &str, title: &str, description: &str) -> String {
    format!(
        "<div class=\"empty-state\">\
            <div class=\"empty-icon\">{}</div>\
            <h3>{}</h3>\
            <p>{}</p>\
        </div>",
        icon, title, description
    )
}

pub async fn form_page() -> Html<&'static str> {
    Html(FORM_PAGE)
}

pub async fn solution_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SolutionQuery>,
) -> Result<Html<String>, TicketError> {
    let ticket = match query.id {
        Some(ref id) => state.tickets.get(id).await?,
        None => None,
    };
    match ticket {
        Some(ticket) => Ok(Html(render_solution_page(&ticket))),
        None => Ok(Html(render_not_found())),
    }
}

pub fn configure_ui_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(form_page))
        .route("/solution", get(solution_page))
}

fn render_detail_rows(ticket: &Ticket) -> String {
    let mut rows = String::new();
    rows.push_str(&format!(
        "<tr><th>Ticket</th><td>{}</td></tr>",
        html_escape(&ticket.id)
    ));
    rows.push_str(&format!(
        "<tr><th>Problem Source</th><td>{}</td></tr>",
        ticket.problem_source.as_str()
    ));
    rows.push_str(&format!(
        "<tr><th>Specific Problem</th><td>{}</td></tr>",
        ticket.specific_problem.as_str()
    ));
    if let Some(issue) = ticket.software_issue {
        rows.push_str(&format!(
            "<tr><th>Software Issue</th><td>{}</td></tr>",
            issue.as_str()
        ));
    }
    if let Some(date) = ticket.date {
        rows.push_str(&format!(
            "<tr><th>Date</th><td>{}</td></tr>",
            date.format("%Y-%m-%d")
        ));
    }
    if !ticket.description.is_empty() {
        rows.push_str(&format!(
            "<tr><th>Description</th><td>{}</td></tr>",
            html_escape(&ticket.description)
        ));
    }
    if !ticket.files.is_empty() {
        rows.push_str(&format!(
            "<tr><th>Attachments</th><td>{} file(s)</td></tr>",
            ticket.files.len()
        ));
    }
    rows
}

fn render_solution_page(ticket: &Ticket) -> String {
    let mut page = String::from(PAGE_HEAD);
    page.push_str("<h1>Suggested Solution</h1><table class=\"ticket-details\">");
    page.push_str(&render_detail_rows(ticket));
    page.push_str("</table>");
    page.push_str(SOLUTION_BODY);
    page
}

fn render_not_found() -> String {
    let mut page = String::from(PAGE_HEAD);
    page.push_str(&render_empty_state(
        "&#128269;",
        "Ticket not found",
        "This ticket does not exist or was already closed.",
    ));
    page.push_str("<p><a href=\"/\">Create a new ticket</a></p></main></body></html>");
    page
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>IT Support</title>
<style>
body { font-family: system-ui, sans-serif; margin: 0; background: #f5f6f8; color: #1f2430; }
main { max-width: 720px; margin: 2rem auto; background: #fff; border-radius: 8px; padding: 2rem; box-shadow: 0 1px 4px rgba(0,0,0,.08); }
h1 { margin-top: 0; font-size: 1.4rem; }
label { display: block; margin: .75rem 0 .25rem; font-weight: 600; }
select, input, textarea { width: 100%; padding: .5rem; border: 1px solid #c8cdd6; border-radius: 4px; font: inherit; box-sizing: border-box; }
button { margin-top: 1rem; padding: .5rem 1.25rem; border: 0; border-radius: 4px; background: #2456d6; color: #fff; font: inherit; cursor: pointer; }
button.secondary { background: #6b7280; }
.step { display: none; }
.step.active { display: block; }
.ticket-details { border-collapse: collapse; margin-bottom: 1rem; }
.ticket-details th { text-align: left; padding: .25rem .75rem .25rem 0; }
.ticket-details td { padding: .25rem 0; }
#solution-output { white-space: pre-wrap; background: #f8f9fb; border: 1px solid #e2e5ea; border-radius: 4px; padding: 1rem; min-height: 6rem; }
.inline-error { color: #b42318; margin: .75rem 0; }
.empty-state { text-align: center; padding: 2rem 0; }
.empty-icon { font-size: 2rem; }
.hidden { display: none; }
</style>
</head>
<body>
<main>
"#;

const SOLUTION_BODY: &str = r#"<div id="solution-output"></div>
<div id="solution-error" class="inline-error hidden"></div>
<button id="retry" class="hidden">Retry generation</button>
<button id="create-another" class="secondary">Create another ticket</button>
<script>
(function () {
  var id = new URLSearchParams(location.search).get("id");
  var output = document.getElementById("solution-output");
  var errorBox = document.getElementById("solution-error");
  var retry = document.getElementById("retry");
  var source = null;

  function showError(message) {
    errorBox.textContent = message;
    errorBox.classList.remove("hidden");
    retry.classList.remove("hidden");
  }

  function start() {
    errorBox.classList.add("hidden");
    retry.classList.add("hidden");
    output.textContent = "";
    if (source) { source.close(); }
    source = new EventSource("/api/tickets/" + encodeURIComponent(id) + "/solution");
    source.addEventListener("token", function (e) {
      output.textContent += JSON.parse(e.data).data.content;
    });
    source.addEventListener("error", function (e) {
      if (e.data) {
        showError("Generation failed: " + JSON.parse(e.data).data.message);
      } else {
        showError("Connection lost while generating the solution.");
      }
      source.close();
    });
    source.addEventListener("done", function () { source.close(); });
  }

  retry.addEventListener("click", start);
  document.getElementById("create-another").addEventListener("click", function () {
    fetch("/api/tickets/" + encodeURIComponent(id), { method: "DELETE" })
      .finally(function () { location.href = "/"; });
  });

  start();
})();
</script>
</main>
</body>
</html>
"#;

const FORM_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>IT Support - New Ticket</title>
<style>
body { font-family: system-ui, sans-serif; margin: 0; background: #f5f6f8; color: #1f2430; }
main { max-width: 720px; margin: 2rem auto; background: #fff; border-radius: 8px; padding: 2rem; box-shadow: 0 1px 4px rgba(0,0,0,.08); }
h1 { margin-top: 0; font-size: 1.4rem; }
label { display: block; margin: .75rem 0 .25rem; font-weight: 600; }
select, input, textarea { width: 100%; padding: .5rem; border: 1px solid #c8cdd6; border-radius: 4px; font: inherit; box-sizing: border-box; }
button { margin-top: 1rem; margin-right: .5rem; padding: .5rem 1.25rem; border: 0; border-radius: 4px; background: #2456d6; color: #fff; font: inherit; cursor: pointer; }
button.secondary { background: #6b7280; }
.step { display: none; }
.step.active { display: block; }
.inline-error { color: #b42318; margin: .75rem 0; }
.hidden { display: none; }
</style>
</head>
<body>
<main>
<h1>Report an IT problem</h1>
<div id="form-error" class="inline-error hidden"></div>

<section class="step active" data-step="0">
  <label for="problemSource">Where is the problem?</label>
  <select id="problemSource">
    <option value="pc">PC / Laptop</option>
    <option value="network">Network</option>
    <option value="mobile">Mobile</option>
    <option value="other">Other</option>
  </select>
  <label for="specificProblem">What specifically?</label>
  <select id="specificProblem"></select>
  <div id="softwareIssueWrap" class="hidden">
    <label for="softwareIssue">Which software issue?</label>
    <select id="softwareIssue">
      <option value="windows-update">Windows update</option>
      <option value="driver-issue">Driver issue</option>
      <option value="application-crash">Application crash</option>
      <option value="virus-malware">Virus / malware</option>
      <option value="performance-slow">Slow performance</option>
      <option value="startup-issue">Startup issue</option>
      <option value="other">Other</option>
    </select>
  </div>
  <button data-next>Next</button>
</section>

<section class="step" data-step="1">
  <label for="date">When did it start? (optional)</label>
  <input type="date" id="date">
  <label for="description">Describe the problem (optional)</label>
  <textarea id="description" rows="5"></textarea>
  <label for="files">Attach screenshots or logs (optional)</label>
  <input type="file" id="files" multiple>
  <button data-back class="secondary">Back</button>
  <button data-next>Next</button>
</section>

<section class="step" data-step="2">
  <p>Review your ticket, then submit to get an AI-generated troubleshooting suggestion.</p>
  <button data-back class="secondary">Back</button>
  <button id="submit">Submit ticket</button>
</section>

<script>
(function () {
  var PROBLEMS = {
    pc: [
      ["no-power", "No power"],
      ["no-display", "No display"],
      ["no-keyboard", "Keyboard not working"],
      ["no-mouse", "Mouse not working"],
      ["no-audio", "No audio"],
      ["software-issue", "Software issue"],
      ["other", "Other"]
    ],
    network: [
      ["no-internet", "No internet"],
      ["no-wifi", "No Wi-Fi"],
      ["no-ethernet", "No ethernet"],
      ["no-vpn", "VPN not working"],
      ["other", "Other"]
    ],
    mobile: [
      ["no-signal", "No signal"],
      ["no-voice", "No voice calls"],
      ["no-data", "No mobile data"],
      ["no-charging", "Not charging"],
      ["other", "Other"]
    ],
    other: [["other", "Other"]]
  };

  var sourceSelect = document.getElementById("problemSource");
  var problemSelect = document.getElementById("specificProblem");
  var softwareWrap = document.getElementById("softwareIssueWrap");
  var errorBox = document.getElementById("form-error");
  var current = 0;

  function fillProblems() {
    problemSelect.innerHTML = "";
    PROBLEMS[sourceSelect.value].forEach(function (pair) {
      var opt = document.createElement("option");
      opt.value = pair[0];
      opt.textContent = pair[1];
      problemSelect.appendChild(opt);
    });
    toggleSoftware();
  }

  function toggleSoftware() {
    softwareWrap.classList.toggle("hidden", problemSelect.value !== "software-issue");
  }

  function showStep(index) {
    current = index;
    document.querySelectorAll(".step").forEach(function (step) {
      step.classList.toggle("active", Number(step.dataset.step) === index);
    });
  }

  sourceSelect.addEventListener("change", fillProblems);
  problemSelect.addEventListener("change", toggleSoftware);
  document.querySelectorAll("[data-next]").forEach(function (btn) {
    btn.addEventListener("click", function () { showStep(current + 1); });
  });
  document.querySelectorAll("[data-back]").forEach(function (btn) {
    btn.addEventListener("click", function () { showStep(current - 1); });
  });

  function readFiles() {
    var input = document.getElementById("files");
    var files = Array.prototype.slice.call(input.files);
    return Promise.all(files.map(function (file) {
      return new Promise(function (resolve, reject) {
        var reader = new FileReader();
        reader.onload = function () {
          resolve({ name: file.name, base64: reader.result, type: file.type });
        };
        reader.onerror = reject;
        reader.readAsDataURL(file);
      });
    }));
  }

  document.getElementById("submit").addEventListener("click", function () {
    errorBox.classList.add("hidden");
    readFiles().then(function (files) {
      var body = {
        problemSource: sourceSelect.value,
        specificProblem: problemSelect.value,
        date: document.getElementById("date").value || null,
        description: document.getElementById("description").value || null,
        files: files
      };
      if (problemSelect.value === "software-issue") {
        body.softwareIssue = document.getElementById("softwareIssue").value;
      }
      return fetch("/api/tickets", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(body)
      });
    }).then(function (response) {
      if (!response.ok) {
        return response.json().then(function (payload) {
          throw new Error(payload.error || "Submission failed");
        });
      }
      return response.json();
    }).then(function (ticket) {
      location.href = "/solution?id=" + encodeURIComponent(ticket.id);
    }).catch(function (err) {
      errorBox.textContent = err.message;
      errorBox.classList.remove("hidden");
    });
  });

  fillProblems();
})();
</script>
</main>
</body>
</html>
"#;
