use axum::{response::Html, routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Agentic AI for Research</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 2rem; color: #1d1d1f; max-width: 60rem; }
    h1 { margin-bottom: 0.5rem; }
    .card { border: 1px solid #ddd; padding: 1rem; border-radius: 8px; margin-bottom: 1rem; }
    input { width: 100%; padding: 0.5rem; box-sizing: border-box; }
    button { margin-top: 1rem; padding: 0.6rem 1rem; }
    pre { background: #f6f8fa; padding: 1rem; overflow: auto; white-space: pre-wrap; }
    .hidden { display: none; }
    .error { background: #fdecea; color: #611a15; padding: 1rem; border-radius: 8px; }
    .final { background: #edf7ed; padding: 1rem; border-radius: 8px; }
  </style>
</head>
<body>
  <h1>Agentic AI for Research</h1>
  <p>Ask a research question. The agent fetches papers from arXiv, searches the web and reasons its way to an answer.</p>

  <div class="card">
    <label for="query">Enter your research query:</label>
    <input id="query" placeholder="e.g. What are the key ideas behind transformer architectures?" />
    <button id="runBtn">Run Agent</button>
    <p id="spinner" class="hidden">Agent is thinking...</p>
  </div>

  <div class="card">
    <h2>Agent output</h2>
    <pre id="live" aria-live="polite"></pre>
  </div>

  <div id="final" class="final hidden">
    <h2>✅ Final Answer</h2>
    <pre id="answer"></pre>
  </div>

  <div id="error" class="error hidden"></div>

  <script>
    const runBtn = document.getElementById('runBtn');
    const query = document.getElementById('query');
    const spinner = document.getElementById('spinner');
    const live = document.getElementById('live');
    const finalBox = document.getElementById('final');
    const answer = document.getElementById('answer');
    const errorBox = document.getElementById('error');

    function showError(message) {
      errorBox.textContent = 'Agent encountered an error: ' + message;
      errorBox.classList.remove('hidden');
    }

    function handleEvent(name, data) {
      const payload = JSON.parse(data);
      if (name === 'token') {
        live.textContent += payload.content;
      } else if (name === 'final') {
        answer.textContent = payload.answer;
        finalBox.classList.remove('hidden');
      } else if (name === 'error') {
        showError(payload.message);
      }
    }

    function dispatchFrame(frame) {
      let name = 'message';
      const data = [];
      for (const line of frame.split('\n')) {
        if (line.startsWith('event:')) name = line.slice(6).trim();
        else if (line.startsWith('data:')) data.push(line.slice(5).replace(/^ /, ''));
      }
      if (data.length) handleEvent(name, data.join('\n'));
    }

    runBtn.addEventListener('click', async () => {
      const text = query.value;
      if (!text.trim()) return;

      live.textContent = '';
      answer.textContent = '';
      finalBox.classList.add('hidden');
      errorBox.classList.add('hidden');
      spinner.classList.remove('hidden');
      runBtn.disabled = true;

      try {
        const res = await fetch('/api/agent/run', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ query: text })
        });
        if (!res.ok) {
          const json = await res.json().catch(() => ({ error: res.statusText }));
          showError(json.error);
          return;
        }

        const reader = res.body.getReader();
        const decoder = new TextDecoder();
        let buffer = '';
        while (true) {
          const { value, done } = await reader.read();
          if (done) break;
          buffer += decoder.decode(value, { stream: true }).replace(/\r\n/g, '\n');
          let split;
          while ((split = buffer.indexOf('\n\n')) !== -1) {
            dispatchFrame(buffer.slice(0, split));
            buffer = buffer.slice(split + 2);
          }
        }
      } catch (err) {
        showError(err.message);
      } finally {
        spinner.classList.add('hidden');
        runBtn.disabled = false;
      }
    });
  </script>
</body>
</html>"#)
}
