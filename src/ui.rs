use crate::models::{Journey, metric_label};

pub fn render_index(journey: &Journey) -> String {
    let metric_options: String = journey
        .metrics
        .iter()
        .map(|metric| {
            format!(
                r#"<option value="{}">{}</option>"#,
                escape_html(metric),
                escape_html(&metric_label(metric))
            )
        })
        .collect();
    let category_options: String = journey
        .categories
        .iter()
        .map(|category| {
            let category = escape_html(category);
            format!(r#"<option value="{category}">{category}</option>"#)
        })
        .collect();
    INDEX_HTML
        .replace("{{METRIC_OPTIONS}}", &metric_options)
        .replace("{{CATEGORY_OPTIONS}}", &category_options)
        .replace("{{POINT_COUNT}}", &journey.points.len().to_string())
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Emotion Journey</title>
  <style>
    :root {
      --bg-1: #eef3f8;
      --bg-2: #cfe3f2;
      --ink: #22303c;
      --accent: #4bc0c0;
      --accent-2: #ff6384;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(34, 48, 60, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #f7fbff 70%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(960px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Georgia", serif;
      margin: 0;
    }

    .subtitle,
    .hint {
      margin: 0;
      color: #5f6b75;
    }

    .card {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(34, 48, 60, 0.08);
      display: grid;
      gap: 12px;
    }

    .row {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      align-items: center;
    }

    input,
    select,
    textarea {
      font: inherit;
      padding: 8px 10px;
      border-radius: 10px;
      border: 1px solid rgba(34, 48, 60, 0.2);
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 10px 16px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
      background: var(--ink);
      color: white;
    }

    button.secondary {
      background: rgba(34, 48, 60, 0.08);
      color: var(--ink);
    }

    .chip {
      padding: 6px 12px;
      background: rgba(34, 48, 60, 0.08);
      color: var(--ink);
    }

    .chip.active {
      background: var(--accent);
      color: white;
    }

    .tab.active {
      background: var(--accent-2);
    }

    #chart {
      width: 100%;
      height: 300px;
    }

    .chart-label {
      fill: #6b7580;
      font-size: 11px;
    }

    .chart-grid {
      stroke: rgba(34, 48, 60, 0.1);
    }

    .stats {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(140px, 1fr));
      gap: 12px;
    }

    .stat .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #8b949c;
    }

    .stat .value {
      font-size: 1.5rem;
      font-weight: 600;
    }

    .point-item {
      display: flex;
      justify-content: space-between;
      gap: 12px;
      padding: 8px 0;
      border-bottom: 1px solid rgba(34, 48, 60, 0.06);
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Emotion Journey</h1>
      <p class="subtitle">Record how you feel at each milestone and watch the trend. <span id="point-count">{{POINT_COUNT}}</span> points recorded.</p>
    </header>

    <section class="card data-entry">
      <div class="row">
        <input id="milestone-input" placeholder="Milestone or week name" />
        <label>Value <input id="value-input" type="range" min="0" max="10" value="5" /> <span id="value-display">5</span></label>
        <select id="metric-input">{{METRIC_OPTIONS}}</select>
        <select id="category-input">{{CATEGORY_OPTIONS}}</select>
      </div>
      <textarea id="annotation-input" rows="2" placeholder="Annotation (optional)"></textarea>
      <div class="row">
        <button id="add-point-btn" type="button">Add point</button>
        <button id="cancel-edit-btn" class="secondary" type="button" hidden>Cancel edit</button>
        <input id="metric-name-input" placeholder="New metric" />
        <button id="add-metric-btn" class="secondary" type="button">Add metric</button>
      </div>
    </section>

    <section class="card">
      <div class="row" id="metric-chips"></div>
      <div class="row">
        <label>Category
          <select id="filter-select"><option value="all">All</option>{{CATEGORY_OPTIONS}}</select>
        </label>
        <label>Sort
          <select id="sort-select">
            <option value="by_milestone">By milestone</option>
            <option value="by_value">By value</option>
          </select>
        </label>
        <button class="tab active" type="button" data-tab="trend">Trend</button>
        <button class="tab secondary" type="button" data-tab="radar">Radar</button>
      </div>
      <svg id="chart" viewBox="0 0 640 300" role="img" aria-label="Journey chart"></svg>
      <div class="stats">
        <div class="stat"><span class="label" id="stat-title">Metric</span><span class="value" id="stat-metric">--</span></div>
        <div class="stat"><span class="label">Average</span><span class="value" id="stat-mean">--</span></div>
        <div class="stat"><span class="label">Highest</span><span class="value" id="stat-max">--</span></div>
        <div class="stat"><span class="label">Lowest</span><span class="value" id="stat-min">--</span></div>
        <div class="stat"><span class="label">Trend</span><span class="value" id="stat-trend">--</span></div>
      </div>
    </section>

    <section class="card">
      <div id="points-list"></div>
    </section>

    <section class="row">
      <button id="save-btn" type="button">Save</button>
      <button id="load-btn" class="secondary" type="button">Load</button>
      <a href="/api/export"><button class="secondary" type="button">Export</button></a>
      <label class="secondary">Import <input id="import-input" type="file" accept="application/json" /></label>
    </section>

    <div class="status" id="status"></div>
  </main>

  <script>
    const COLORS = ['#4bc0c0', '#ff6384', '#36a2eb', '#ff9f40', '#9966ff', '#c9cb3f'];
    const $ = (id) => document.getElementById(id);
    const chartEl = $('chart');
    const statusEl = $('status');
    let view = null;
    let activeTab = 'trend';
    let editingId = null;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
      if (type === 'ok') {
        setTimeout(() => setStatus('', ''), 1500);
      }
    };

    const escapeText = (text) => {
      const span = document.createElement('span');
      span.textContent = text;
      return span.innerHTML;
    };

    const api = async (method, url, body) => {
      const options = { method, headers: {} };
      if (body !== undefined) {
        options.headers['content-type'] = 'application/json';
        options.body = typeof body === 'string' ? body : JSON.stringify(body);
      }
      const res = await fetch(url, options);
      if (!res.ok) {
        throw new Error((await res.text()) || 'Request failed');
      }
      return res.json();
    };

    const renderTrend = () => {
      const { labels, series, markers } = view.chart;
      if (!labels.length) {
        chartEl.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data yet</text>';
        return;
      }
      const width = 640, height = 300, padX = 44, padY = 34, top = 24;
      const xStep = labels.length > 1 ? (width - padX * 2) / (labels.length - 1) : 0;
      const x = (i) => padX + i * xStep;
      const y = (v) => height - padY - (v / 10) * (height - top - padY);
      let svg = '';
      for (let v = 0; v <= 10; v += 2) {
        svg += `<line class="chart-grid" x1="${padX}" y1="${y(v)}" x2="${width - padX}" y2="${y(v)}" />`;
        svg += `<text class="chart-label" x="${padX - 10}" y="${y(v) + 4}" text-anchor="end">${v}</text>`;
      }
      series.forEach((line, s) => {
        const color = COLORS[s % COLORS.length];
        let path = '';
        let pen = 'M';
        line.values.forEach((value, i) => {
          if (value === null) {
            pen = 'M';
            return;
          }
          path += `${pen} ${x(i).toFixed(1)} ${y(value).toFixed(1)} `;
          pen = 'L';
          svg += `<circle cx="${x(i)}" cy="${y(value)}" r="4" fill="white" stroke="${color}" stroke-width="2" />`;
        });
        svg += `<path d="${path}" fill="none" stroke="${color}" stroke-width="3" />`;
        svg += `<text x="${width - padX}" y="${14 + s * 14}" fill="${color}" font-size="12" text-anchor="end">${escapeText(line.label)}</text>`;
      });
      markers.forEach((marker) => {
        svg += `<text class="chart-label" x="${x(marker.position)}" y="${y(marker.value) - 10}" text-anchor="middle">${escapeText(marker.annotation)}</text>`;
      });
      labels.forEach((label, i) => {
        svg += `<text class="chart-label" x="${x(i)}" y="${height - padY + 18}" text-anchor="middle">${escapeText(label)}</text>`;
      });
      chartEl.innerHTML = svg;
    };

    const renderRadar = () => {
      const entries = view.radar.entries;
      const cx = 320, cy = 150, radius = 110;
      const angle = (i) => -Math.PI / 2 + (2 * Math.PI * i) / Math.max(entries.length, 1);
      const at = (i, v) => [cx + Math.cos(angle(i)) * radius * v / 10, cy + Math.sin(angle(i)) * radius * v / 10];
      let svg = '';
      [2, 4, 6, 8, 10].forEach((ring) => {
        svg += `<circle class="chart-grid" cx="${cx}" cy="${cy}" r="${radius * ring / 10}" fill="none" />`;
      });
      entries.forEach((entry, i) => {
        const [lx, ly] = at(i, 11.5);
        svg += `<text class="chart-label" x="${lx}" y="${ly}" text-anchor="middle">${escapeText(entry.label)} (${entry.value})</text>`;
      });
      const shape = entries.map((entry, i) => at(i, entry.value).join(',')).join(' ');
      svg += `<polygon points="${shape}" fill="rgba(75, 192, 192, 0.3)" stroke="${COLORS[0]}" stroke-width="2" />`;
      chartEl.innerHTML = svg;
    };

    const renderStats = () => {
      const stats = view.statistics;
      $('stat-metric').textContent = stats ? stats.metric : '--';
      $('stat-mean').textContent = stats && stats.mean !== null ? stats.mean.toFixed(2) : '--';
      $('stat-max').textContent = stats && stats.max !== null ? stats.max : '--';
      $('stat-min').textContent = stats && stats.min !== null ? stats.min : '--';
      $('stat-trend').textContent = stats ? stats.trend : '--';
    };

    // Rebuilds a select from the journey's names after loads and imports.
    const syncSelect = (id, names, keep = []) => {
      const select = $(id);
      const current = select.value;
      select.innerHTML = '';
      keep.concat(names.map((name) => [name, id === 'metric-input' ? name.charAt(0).toUpperCase() + name.slice(1) : name]))
        .forEach(([value, label]) => {
          const option = document.createElement('option');
          option.value = value;
          option.textContent = label;
          select.appendChild(option);
        });
      if ([...select.options].some((option) => option.value === current)) {
        select.value = current;
      }
    };

    const renderChips = () => {
      const chips = $('metric-chips');
      chips.innerHTML = '';
      view.metrics.forEach((metric) => {
        const chip = document.createElement('button');
        const active = view.selection.metrics.includes(metric);
        chip.className = 'chip' + (active ? ' active' : '');
        chip.type = 'button';
        chip.textContent = metric;
        chip.addEventListener('click', () => {
          const method = active ? 'DELETE' : 'POST';
          api(method, `/api/selection/metrics/${encodeURIComponent(metric)}`)
            .then(refresh)
            .catch((err) => setStatus(err.message, 'error'));
        });
        chips.appendChild(chip);
      });
    };

    const renderList = () => {
      const list = $('points-list');
      list.innerHTML = '';
      view.groups.forEach((group) => {
        const heading = document.createElement('h3');
        heading.textContent = group.label;
        list.appendChild(heading);
        group.points.forEach((point) => {
          const item = document.createElement('div');
          item.className = 'point-item';
          item.innerHTML = `
            <div>
              <strong>${escapeText(point.milestone)}:</strong> ${point.value}/10
              <small>${escapeText(point.category)}</small>
              ${point.annotation ? `<br><em>${escapeText(point.annotation)}</em>` : ''}
            </div>
            <div>
              <button class="secondary edit-btn" type="button">Edit</button>
              <button class="secondary delete-btn" type="button">Delete</button>
            </div>`;
          item.querySelector('.edit-btn').addEventListener('click', () => startEdit(point.id));
          item.querySelector('.delete-btn').addEventListener('click', () => {
            if (confirm('Are you sure you want to delete this point?')) {
              api('DELETE', `/api/points/${point.id}`).then(refresh).catch((err) => setStatus(err.message, 'error'));
            }
          });
          list.appendChild(item);
        });
      });
    };

    const render = () => {
      $('point-count').textContent = view.groups.reduce((n, g) => n + g.points.length, 0);
      syncSelect('metric-input', view.metrics);
      syncSelect('category-input', view.categories);
      syncSelect('filter-select', view.categories, [['all', 'All']]);
      $('filter-select').value = view.selection.filter;
      $('sort-select').value = view.selection.sort;
      renderChips();
      renderStats();
      renderList();
      if (activeTab === 'radar') {
        renderRadar();
      } else {
        renderTrend();
      }
    };

    const refresh = async () => {
      view = await api('GET', '/api/view');
      render();
    };

    const resetForm = () => {
      editingId = null;
      $('milestone-input').value = '';
      $('value-input').value = 5;
      $('value-display').textContent = '5';
      $('annotation-input').value = '';
      $('add-point-btn').textContent = 'Add point';
      $('cancel-edit-btn').hidden = true;
    };

    const startEdit = async (id) => {
      const point = await api('GET', `/api/points/${id}`);
      editingId = id;
      $('milestone-input').value = point.milestone;
      $('value-input').value = point.value;
      $('value-display').textContent = point.value;
      $('annotation-input').value = point.annotation || '';
      $('metric-input').value = point.metric;
      $('category-input').value = point.category;
      $('add-point-btn').textContent = 'Update point';
      $('cancel-edit-btn').hidden = false;
      document.querySelector('.data-entry').scrollIntoView({ behavior: 'smooth' });
    };

    const submitPoint = async () => {
      const body = {
        milestone: $('milestone-input').value,
        value: parseInt($('value-input').value, 10),
        annotation: $('annotation-input').value,
        category: $('category-input').value,
        metric: $('metric-input').value
      };
      if (editingId === null) {
        await api('POST', '/api/points', body);
      } else {
        await api('PUT', `/api/points/${editingId}`, body);
      }
      resetForm();
      await refresh();
    };

    const addMetric = async () => {
      const created = await api('POST', '/api/metrics', { name: $('metric-name-input').value });
      $('metric-name-input').value = '';
      await refresh();
      $('metric-input').value = created.metric;
    };

    const runAction = (action) => action().catch((err) => setStatus(err.message, 'error'));

    $('value-input').addEventListener('input', () => {
      $('value-display').textContent = $('value-input').value;
    });
    $('add-point-btn').addEventListener('click', () => runAction(submitPoint));
    $('cancel-edit-btn').addEventListener('click', resetForm);
    $('add-metric-btn').addEventListener('click', () => runAction(addMetric));
    $('filter-select').addEventListener('change', (e) =>
      runAction(() => api('PATCH', '/api/selection', { filter: e.target.value }).then(refresh)));
    $('sort-select').addEventListener('change', (e) =>
      runAction(() => api('PATCH', '/api/selection', { sort: e.target.value }).then(refresh)));
    document.querySelectorAll('.tab').forEach((tab) => {
      tab.addEventListener('click', () => {
        activeTab = tab.dataset.tab;
        document.querySelectorAll('.tab').forEach((other) => {
          other.classList.toggle('active', other === tab);
          other.classList.toggle('secondary', other !== tab);
        });
        render();
      });
    });
    $('save-btn').addEventListener('click', () =>
      runAction(async () => setStatus((await api('POST', '/api/save')).message, 'ok')));
    $('load-btn').addEventListener('click', () =>
      runAction(async () => {
        const result = await api('POST', '/api/load');
        await refresh();
        setStatus(result.message, 'ok');
      }));
    $('import-input').addEventListener('change', (e) => {
      const file = e.target.files[0];
      if (!file) {
        return;
      }
      runAction(async () => {
        const result = await api('POST', '/api/import', await file.text());
        e.target.value = '';
        await refresh();
        setStatus(result.message, 'ok');
      });
    });

    refresh().catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;
