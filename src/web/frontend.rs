//! Embedded HTML/CSS/JS frontend for the copilot dashboard.
//!
//! The entire SPA is compiled into the binary as a string constant.
//! Charts arrive pre-rendered as SVG from `/api/dashboard`.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Web Copilot</title>
<style>
:root {
  --bg: #f4f6f8;
  --surface: #ffffff;
  --border: #dde2e6;
  --text: #1f2933;
  --text-muted: #6b7785;
  --accent: #2f7d7d;
  --nav: #1f2933;
  --red: #c0392b;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

/* Navigation bar */
.navbar {
  display: flex;
  align-items: center;
  gap: 24px;
  padding: 12px 24px;
  background: var(--nav);
  color: #fff;
}
.navbar .brand { font-weight: 700; font-size: 16px; }
.navbar ul { display: flex; gap: 16px; list-style: none; }
.navbar li { color: #cbd2d9; font-size: 13px; }

/* Layout */
.layout {
  display: grid;
  grid-template-columns: 220px 1fr;
  min-height: calc(100vh - 48px);
}

.sidebar {
  background: var(--surface);
  border-right: 1px solid var(--border);
  padding: 16px;
}
.sidebar h4 {
  font-size: 12px;
  text-transform: uppercase;
  color: var(--text-muted);
  margin: 12px 0 6px;
}
.sidebar button {
  display: flex;
  gap: 8px;
  width: 100%;
  padding: 8px 10px;
  border: none;
  border-radius: 6px;
  background: transparent;
  color: var(--text);
  font-size: 14px;
  text-align: left;
  cursor: pointer;
}
.sidebar button:hover { background: rgba(0,0,0,0.04); }
.sidebar button.active { background: var(--accent); color: #fff; }
.sidebar .history { list-style: none; font-size: 12px; color: var(--text-muted); }
.sidebar .history li {
  padding: 4px 0;
  border-bottom: 1px solid var(--border);
  overflow: hidden;
  text-overflow: ellipsis;
  white-space: nowrap;
}

main { padding: 24px; }
main h1 { font-size: 22px; margin-bottom: 16px; }

.widget-card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 16px;
  margin-bottom: 16px;
}
.widget-card h3 { font-size: 15px; margin-bottom: 8px; }
.widget-card svg { width: 100%; height: auto; }
.widget-card .muted { color: var(--text-muted); font-size: 13px; }

/* Chat */
.chat form { display: flex; gap: 8px; margin-bottom: 12px; }
.chat input {
  flex: 1;
  padding: 8px 10px;
  border: 1px solid var(--border);
  border-radius: 6px;
  font-size: 14px;
}
.chat button {
  padding: 8px 16px;
  border: none;
  border-radius: 6px;
  background: var(--accent);
  color: #fff;
  cursor: pointer;
}
.chat .response { white-space: pre-wrap; }
.chat .response.errored { color: var(--red); }
</style>
</head>
<body>
<nav class="navbar">
  <span class="brand" id="brand"></span>
  <ul id="nav-items"></ul>
</nav>

<div class="layout">
  <aside class="sidebar">
    <h4>Panels</h4>
    <div id="panel-buttons"></div>
    <h4>History</h4>
    <ul class="history" id="history"></ul>
  </aside>

  <main>
    <h1 id="header"></h1>
    <div id="results"></div>

    <section class="widget-card chat">
      <h3>Ask a question</h3>
      <form id="chat-form">
        <input id="question" type="text" autocomplete="off" placeholder="Ask about GDP, CO₂ or land use">
        <button type="submit">Ask</button>
      </form>
      <div class="response" id="response"></div>
    </section>
  </main>
</div>

<script>
// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------

async function getJson(path) {
  const res = await fetch(path);
  return res.json();
}

async function postJson(path, body) {
  const res = await fetch(path, {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify(body),
  });
  return res.json();
}

function esc(text) {
  const div = document.createElement('div');
  div.textContent = text == null ? '' : String(text);
  return div.innerHTML;
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

let pollTimer = null;

function render(view) {
  document.getElementById('brand').textContent = view.nav.brand;
  document.getElementById('nav-items').innerHTML =
    view.nav.items.map(item => `<li>${esc(item)}</li>`).join('');
  document.getElementById('header').textContent = view.header;

  document.getElementById('panel-buttons').innerHTML = view.sidebar.map(entry =>
    `<button data-panel="${esc(entry.id)}" class="${entry.selected ? 'active' : ''}">` +
    `<span>${esc(entry.icon)}</span><span>${esc(entry.label)}</span></button>`
  ).join('');
  document.querySelectorAll('#panel-buttons button').forEach(btn => {
    btn.addEventListener('click', () => select(btn.dataset.panel));
  });

  const results = view.panels.filter(p => p.visible).map(p => {
    let body = '';
    if (p.status === 'loading' || p.status === 'unmounted') {
      body = '<p class="muted">Loading…</p>';
    } else if (p.chart_svg) {
      body = p.chart_svg;
    }
    return `<div class="widget-card" data-panel="${esc(p.id)}"><h3>${esc(p.title)}</h3>${body}</div>`;
  });
  document.getElementById('results').innerHTML = results.join('');

  document.getElementById('history').innerHTML =
    view.chat.history.map(h => `<li title="${esc(h.question)}">${esc(h.question)}</li>`).join('');

  const response = document.getElementById('response');
  response.classList.toggle('errored', view.chat.phase === 'errored');
  if (view.chat.phase === 'awaiting_response') {
    response.textContent = 'Waiting for answer…';
  } else {
    response.textContent = view.chat.response || '';
  }

  const loading = view.panels.some(p => p.status === 'loading' || p.status === 'unmounted');
  schedulePoll(loading || view.chat.phase === 'awaiting_response');
}

function schedulePoll(active) {
  if (pollTimer) {
    clearTimeout(pollTimer);
    pollTimer = null;
  }
  if (active) {
    pollTimer = setTimeout(refresh, 500);
  }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

async function refresh() {
  render(await getJson('/api/dashboard'));
}

async function select(panel) {
  render(await postJson('/api/select', { panel }));
}

document.getElementById('question').addEventListener('input', e => {
  postJson('/api/question', { question: e.target.value });
});

document.getElementById('chat-form').addEventListener('submit', async e => {
  e.preventDefault();
  const question = document.getElementById('question').value;
  const result = await postJson('/api/ask', { question });
  render(result.dashboard);
});

refresh();
</script>
</body>
</html>
"##;
