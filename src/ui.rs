use crate::models::{Category, Frequency, NormalizedHabit, Profile};
use crate::normalize::is_completed_on;
use crate::notify::{NoticeKind, Notification};
use chrono::NaiveDate;

pub fn render_dashboard(
    habits: &[NormalizedHabit],
    profile: Option<&Profile>,
    notices: &[Notification],
    today: NaiveDate,
) -> String {
    let greeting = profile
        .map(|profile| escape_html(profile.display_name()))
        .unwrap_or_default();
    let cards = if habits.is_empty() {
        EMPTY_STATE.to_string()
    } else {
        habits
            .iter()
            .map(|habit| render_card(habit, today))
            .collect::<Vec<_>>()
            .join("\n")
    };

    DASHBOARD_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{NAME}}", &greeting)
        .replace("{{TODAY}}", &today.format("%Y-%m-%d").to_string())
        .replace("{{NOTICES}}", &render_notices(notices))
        .replace("{{CATEGORIES}}", &category_options())
        .replace("{{FREQUENCIES}}", &frequency_options())
        .replace("{{HABITS}}", &cards)
}

pub fn render_login(notices: &[Notification]) -> String {
    LOGIN_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{NOTICES}}", &render_notices(notices))
}

pub fn render_forgot_password(notices: &[Notification]) -> String {
    FORGOT_PASSWORD_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{NOTICES}}", &render_notices(notices))
}

fn render_card(habit: &NormalizedHabit, today: NaiveDate) -> String {
    let id = escape_html(&habit.id);
    let done_today = is_completed_on(habit, today);
    let metric = match habit.frequency {
        Frequency::EveryDay => format!("Completed days: {}", habit.streak_days),
        Frequency::Weekly => format!("Goal: {} per week", habit.goal.unwrap_or(1)),
    };
    let toggle = if done_today {
        r#"<button class="done" disabled>Done today</button>"#.to_string()
    } else {
        format!(
            r#"<form method="post" action="/habits/{id}/toggle"><button class="primary">Mark done</button></form>"#
        )
    };

    format!(
        r#"<article class="habit{done_class}">
  <header>
    <h3>{title}</h3>
    <span class="tag">{category} · {frequency}</span>
  </header>
  <p class="description">{description}</p>
  <div class="bar"><span style="width: {percent:.0}%"></span></div>
  <div class="meta"><strong>{percent:.0}%</strong><span>{metric}</span></div>
  <div class="actions">
    {toggle}
    <form method="post" action="/habits/{id}/delete"><button class="ghost">Delete</button></form>
  </div>
  <form class="notes" method="post" action="/habits/{id}/notes">
    <textarea name="notes" placeholder="Notes (kept for this session)">{notes}</textarea>
    <button class="ghost">Save notes</button>
  </form>
</article>"#,
        done_class = if done_today { " complete" } else { "" },
        title = escape_html(&habit.title),
        category = habit.category.wire_name(),
        frequency = habit.frequency.wire_name(),
        description = escape_html(&habit.description),
        percent = habit.progress_percent.clamp(0.0, 100.0),
        notes = escape_html(habit.notes.as_deref().unwrap_or_default()),
    )
}

fn render_notices(notices: &[Notification]) -> String {
    notices
        .iter()
        .map(|notice| {
            let class = match notice.kind {
                NoticeKind::Success => "success",
                NoticeKind::Destructive => "destructive",
                NoticeKind::Info => "info",
            };
            format!(
                r#"<div class="notice {class}"><strong>{}</strong> {}</div>"#,
                escape_html(&notice.title),
                escape_html(&notice.description)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn category_options() -> String {
    Category::ALL
        .iter()
        .map(|category| {
            let name = category.wire_name();
            format!(r#"<option value="{name}">{name}</option>"#)
        })
        .collect()
}

fn frequency_options() -> String {
    [Frequency::EveryDay, Frequency::Weekly]
        .iter()
        .map(|frequency| {
            let name = frequency.wire_name();
            format!(r#"<option value="{name}">{name}</option>"#)
        })
        .collect()
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

const EMPTY_STATE: &str = r#"<div class="empty">
  <h3>No habits yet</h3>
  <p>Start by adding your first habit above.</p>
</div>"#;

const STYLE: &str = r#"
    :root {
      --bg-1: #f3f6ef;
      --bg-2: #cfe8d5;
      --ink: #23302a;
      --accent: #2f9e6b;
      --accent-2: #2f4858;
      --danger: #c8473a;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e9f4ec 60%, #f6f9f4 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: start center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(920px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    header.top {
      display: flex;
      justify-content: space-between;
      align-items: center;
    }

    h1 {
      margin: 0;
      font-size: 2rem;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(260px, 1fr));
      gap: 16px;
    }

    .habit {
      border: 1px solid rgba(47, 72, 88, 0.12);
      border-radius: 18px;
      padding: 18px;
      display: grid;
      gap: 10px;
      background: #fff;
    }

    .habit.complete {
      border-color: var(--accent);
    }

    .habit h3 {
      margin: 0;
    }

    .tag {
      font-size: 0.8rem;
      color: var(--accent-2);
    }

    .bar {
      height: 8px;
      border-radius: 999px;
      background: rgba(47, 72, 88, 0.1);
      overflow: hidden;
    }

    .bar span {
      display: block;
      height: 100%;
      background: var(--accent);
    }

    .meta,
    .actions {
      display: flex;
      justify-content: space-between;
      align-items: center;
      gap: 8px;
    }

    form {
      margin: 0;
    }

    form.add,
    form.notes,
    form.stack {
      display: grid;
      gap: 8px;
    }

    input,
    select,
    textarea {
      font: inherit;
      padding: 8px 10px;
      border-radius: 10px;
      border: 1px solid rgba(47, 72, 88, 0.2);
    }

    button {
      font: inherit;
      border: none;
      border-radius: 999px;
      padding: 8px 16px;
      cursor: pointer;
    }

    button.primary,
    button.done {
      background: var(--accent);
      color: #fff;
    }

    button.done {
      opacity: 0.6;
      cursor: default;
    }

    button.ghost {
      background: transparent;
      color: var(--accent-2);
      border: 1px solid rgba(47, 72, 88, 0.2);
    }

    .notice {
      border-radius: 12px;
      padding: 10px 14px;
    }

    .notice.success {
      background: #e2f5ea;
    }

    .notice.info {
      background: #e6eef5;
    }

    .notice.destructive {
      background: #fbe3e0;
      color: var(--danger);
    }

    .empty {
      border: 2px dashed rgba(47, 72, 88, 0.2);
      border-radius: 18px;
      padding: 40px;
      text-align: center;
    }
"#;

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>My Habits</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <header class="top">
      <div>
        <h1>My Habits</h1>
        <p>Hi {{NAME}}, today is {{TODAY}}.</p>
      </div>
      <form method="post" action="/logout"><button class="ghost">Log out</button></form>
    </header>
    <section class="notices">
{{NOTICES}}
    </section>
    <form class="add" method="post" action="/habits">
      <input name="title" placeholder="New habit" required />
      <input name="description" placeholder="Description" />
      <select name="category">{{CATEGORIES}}</select>
      <select name="frequency">{{FREQUENCIES}}</select>
      <input name="goal" type="number" min="1" placeholder="Weekly goal" />
      <button class="primary">Add habit</button>
    </form>
    <section class="grid">
{{HABITS}}
    </section>
  </main>
</body>
</html>
"#;

const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Log in</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <h1>Log in to your account</h1>
    <section class="notices">
{{NOTICES}}
    </section>
    <form class="stack" method="post" action="/login">
      <input name="identifier" placeholder="Email or username" autocomplete="username" required />
      <input name="password" type="password" placeholder="Password" autocomplete="current-password" required />
      <button class="primary">Log in</button>
    </form>
    <a href="/forgot-password">Forgot your password?</a>
    <h2>Create an account</h2>
    <form class="stack" method="post" action="/register">
      <input name="name" placeholder="Name" required />
      <input name="email" type="email" placeholder="Email" required />
      <input name="password" type="password" placeholder="Password" required />
      <button class="ghost">Register</button>
    </form>
  </main>
</body>
</html>
"#;

const FORGOT_PASSWORD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Reset password</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <h1>Reset your password</h1>
    <p>Enter your email to receive a password reset link.</p>
    <section class="notices">
{{NOTICES}}
    </section>
    <form class="stack" method="post" action="/forgot-password">
      <input name="email" type="email" placeholder="Email" autocomplete="email" required />
      <button class="primary">Send reset email</button>
    </form>
    <a href="/login">Back to login</a>
  </main>
</body>
</html>
"#;
