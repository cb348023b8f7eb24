use crate::layout::ViewKind;

pub fn render_index(view: ViewKind) -> String {
    let containers: String = view
        .targets()
        .iter()
        .map(|target| {
            let csv = target
                .csv_endpoint()
                .map(|endpoint| {
                    format!(
                        r#"<a class="download" href="/api/export/{endpoint}/csv?view={view}&name={title}">Download CSV</a>"#,
                        title = target.title.replace(' ', "%20"),
                    )
                })
                .unwrap_or_default();
            format!(
                r#"<section class="chart-frame">
      <h2>{title}</h2>
      <div class="plot" id="{container}"><p class="placeholder">Loading visualization...</p></div>
      <div class="actions">
        <a class="download" href="/api/views/{view}/charts/{container}/image">Download Chart</a>
        {csv}
      </div>
    </section>"#,
                title = target.title,
                container = target.container,
            )
        })
        .collect::<Vec<_>>()
        .join("\n    ");

    INDEX_HTML
        .replace("{{VIEW}}", view.name())
        .replace("{{CHARTS}}", &containers)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Health Search Analytics</title>
  <style>
    :root {
      --primary: #2E86AB;
      --secondary: #A23B72;
      --accent: #F18F01;
      --ink: #2C3E50;
      --muted: #546E7A;
      --border: #E1E8ED;
      --bg: #F8F9FA;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      font-family: "Segoe UI", "Inter", sans-serif;
      color: var(--ink);
      background: var(--bg);
    }

    header {
      background: linear-gradient(135deg, var(--primary), var(--secondary));
      color: white;
      padding: 2rem;
    }

    header nav a {
      color: white;
      margin-right: 1rem;
    }

    .filters {
      display: flex;
      flex-wrap: wrap;
      gap: 0.5rem;
      padding: 1rem 2rem;
      border-bottom: 1px solid var(--border);
    }

    .filter-tag {
      border: 1px solid var(--primary);
      border-radius: 999px;
      background: white;
      padding: 0.25rem 0.75rem;
      cursor: pointer;
    }

    .filter-tag.active {
      background: var(--primary);
      color: white;
    }

    main {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(420px, 1fr));
      gap: 1.5rem;
      padding: 2rem;
    }

    .chart-frame {
      background: white;
      border: 1px solid var(--border);
      border-radius: 12px;
      padding: 1rem 1.5rem;
    }

    .plot {
      min-height: 240px;
      font-size: 0.85rem;
      color: var(--muted);
      overflow: auto;
    }

    .placeholder.error {
      color: #C0392B;
    }

    .download {
      display: inline-block;
      margin-right: 0.75rem;
      color: var(--primary);
    }

    #notices {
      position: fixed;
      top: 20px;
      right: 20px;
      display: grid;
      gap: 0.5rem;
    }

    .notice {
      background: white;
      border-left: 4px solid var(--accent);
      padding: 0.75rem 1rem;
      box-shadow: 0 4px 20px rgba(0, 0, 0, 0.08);
      cursor: pointer;
    }
  </style>
</head>
<body>
  <header>
    <h1>Health Search Analytics</h1>
    <nav>
      <a href="/dashboards/main">Main dashboard</a>
      <a href="/dashboards/comparison">City comparison</a>
    </nav>
  </header>

  <div class="filters">
    <label>From <input id="year-min" type="number" /></label>
    <label>To <input id="year-max" type="number" /></label>
    <button class="filter-tag" id="apply-years">Apply years</button>
    <span id="conditions"></span>
    <input id="city" placeholder="City" />
    <button class="filter-tag" id="apply-city">Select city</button>
    <button class="filter-tag" id="reset">Reset</button>
  </div>

  <main>
    {{CHARTS}}
  </main>

  <div id="notices"></div>

  <script>
    const VIEW = "{{VIEW}}";
    const CONDITIONS = ["cancer", "cardiovascular", "stroke", "depression", "rehab", "vaccine", "diarrhea", "obesity", "diabetes"];

    async function change(body) {
      const response = await fetch(`/api/views/${VIEW}/selection`, {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(body)
      });
      if (response.ok) {
        paint(await response.json());
      }
    }

    function paint(snapshot) {
      const selection = snapshot.selection;
      document.getElementById("year-min").value = selection.year_range[0];
      document.getElementById("year-max").value = selection.year_range[1];

      const tags = document.getElementById("conditions");
      tags.innerHTML = "";
      CONDITIONS.forEach((id) => {
        const tag = document.createElement("button");
        tag.className = "filter-tag" + (selection.conditions.includes(id) ? " active" : "");
        tag.textContent = id;
        tag.onclick = () => change({ action: "toggle_condition", id });
        tags.appendChild(tag);
      });

      snapshot.charts.forEach((chart) => {
        const target = document.getElementById(chart.container);
        if (!target) return;
        if (chart.state === "rendered") {
          target.innerHTML = chart.series
            .map((series) => `<div style="color:${series.color}"><strong>${series.label}</strong>: ` +
              series.points.map((p) => `${p.x}=${Math.round(p.y * 100) / 100}`).join(", ") + "</div>")
            .join("");
        } else if (chart.state === "error") {
          target.innerHTML = `<p class="placeholder error">${chart.message}</p>`;
        } else if (chart.state === "no_data") {
          target.innerHTML = `<p class="placeholder">No data for the current selection.</p>`;
        } else {
          target.innerHTML = `<p class="placeholder">Loading visualization...</p>`;
        }
      });

      const notices = document.getElementById("notices");
      notices.innerHTML = "";
      snapshot.notices.forEach((notice) => {
        const item = document.createElement("div");
        item.className = "notice";
        item.textContent = notice.message;
        item.onclick = () => fetch(`/api/views/${VIEW}/notices/${notice.id}`, { method: "DELETE" }).then(refresh);
        notices.appendChild(item);
      });
    }

    async function refresh() {
      const response = await fetch(`/api/views/${VIEW}`);
      if (response.ok) {
        paint(await response.json());
      }
    }

    document.getElementById("apply-years").onclick = () => change({
      action: "year_range",
      min: Number(document.getElementById("year-min").value),
      max: Number(document.getElementById("year-max").value)
    });
    document.getElementById("apply-city").onclick = () => change({
      action: "select_city",
      id: document.getElementById("city").value
    });
    document.getElementById("reset").onclick = () => change({ action: "reset" });

    refresh();
    setInterval(refresh, 2000);
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_lists_every_container_of_the_view() {
        let page = render_index(ViewKind::Comparison);
        for target in ViewKind::Comparison.targets() {
            assert!(page.contains(&format!(r#"id="{}""#, target.container)));
        }
        assert!(page.contains(r#"const VIEW = "comparison";"#));
        assert!(!page.contains("{{"));
    }
}
