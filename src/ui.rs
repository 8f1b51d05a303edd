use crate::game::{letters, GameState, LETTERS};
use crate::recorder::{
    GAME_CONTAINER, MISS_CLASS, PAST_MISS_CLASS, PAST_SUCCESS_CLASS, STATS_CONTAINER_PREFIX,
    SUCCESS_CLASS,
};
use crate::stats::TrickStats;

pub const SCRIPT: &str = include_str!("../static/skrate.js");

const FEED_LENGTH: usize = 5;

pub fn render_index(user: &str, tricks: &[TrickStats], game: Option<&GameState>) -> String {
    let rows: String = tricks.iter().map(render_trick_row).collect();
    INDEX_HTML
        .replace("{{USER}}", &escape_html(user))
        .replace("{{GAME_CONTAINER}}", GAME_CONTAINER)
        .replace("{{GAME}}", &render_game(game))
        .replace("{{TRICKS}}", &rows)
}

fn render_trick_row(stats: &TrickStats) -> String {
    let id = stats.trick_id;
    format!(
        r#"
      <article class="trick" id="trick{id}">
        <h3>{name}</h3>
        <div class="trick-stats" id="{STATS_CONTAINER_PREFIX}{id}">{fragment}</div>
        <div class="trick-actions">
          <button type="button" class="{SUCCESS_CLASS}" id="land-{id}">Landed</button>
          <button type="button" class="{MISS_CLASS}" id="miss-{id}">Missed</button>
          <button type="button" class="past {PAST_SUCCESS_CLASS}" id="pastland-{id}">Past you landed</button>
          <button type="button" class="past {PAST_MISS_CLASS}" id="pastmiss-{id}">Past you missed</button>
        </div>
      </article>"#,
        name = escape_html(&stats.name),
        fragment = render_trick_stats(stats),
    )
}

/// Fragment swapped into `#trickstats<id>` after each attempt.
pub fn render_trick_stats(stats: &TrickStats) -> String {
    let rate = (stats.land_rate() * 100.0).round() as u64;
    format!(
        r#"<span class="stat">Attempts: {} </span><span class="stat">Lands: {} </span><span class="stat">Rate: {rate}% </span><span class="stat">Streak: {} </span>"#,
        stats.attempts, stats.lands, stats.current_streak
    )
}

/// Fragment swapped into `#gamestats`.
pub fn render_game(game: Option<&GameState>) -> String {
    let Some(game) = game else {
        return r#"<p class="hint">No game running. Start one to play S.K.A.T.E. against your past self.</p>"#
            .to_string();
    };

    let feed: String = game
        .status_feed
        .iter()
        .take(FEED_LENGTH)
        .map(|message| format!("<li>{}</li>", escape_html(message)))
        .collect();

    format!(
        r#"<div class="score"><span>New you: <b>{}</b></span><span>Past you: <b>{}</b></span><span>{}</span></div><ul class="feed">{feed}</ul>"#,
        score_letters(game.user_score),
        score_letters(game.opponent_score),
        if game.is_ongoing() { "In progress" } else { "Game over" },
    )
}

fn score_letters(score: usize) -> String {
    if score == 0 {
        "-".to_string()
    } else {
        letters(score.min(LETTERS.len()))
    }
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Skrate</title>
  <style>
    :root {
      --bg-1: #f4f1ea;
      --ink: #22211f;
      --accent: #e8553d;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 18px 40px rgba(47, 72, 88, 0.16);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #e9e4d8 70%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 28px 16px 48px;
    }

    .app {
      width: min(960px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    .card {
      background: var(--card);
      border-radius: 22px;
      box-shadow: var(--shadow);
      padding: 24px;
    }

    .tricks {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(260px, 1fr));
      gap: 16px;
    }

    .trick h3 {
      margin: 0 0 8px;
    }

    .trick-stats .stat {
      margin-right: 10px;
      color: var(--accent-2);
    }

    .trick-actions {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
      margin-top: 12px;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 10px 16px;
      font-weight: 600;
      cursor: pointer;
      color: white;
      background: var(--accent-2);
    }

    .btn-trick-success {
      background: var(--accent);
    }

    button.past {
      background: #8b857d;
      font-size: 0.8rem;
    }

    .score {
      display: flex;
      gap: 18px;
      font-size: 1.1rem;
    }

    .feed {
      margin: 12px 0 0;
      padding-left: 18px;
      color: #5f5c57;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }

    .hint {
      margin: 0;
      color: #6f6a65;
    }
  </style>
</head>
<body>
  <main class="app">
    <header class="card">
      <h1>Skrate</h1>
      <p class="hint">Skating as <b>{{USER}}</b>. Log every land and bail.</p>
    </header>

    <section class="card">
      <h2>Game of S.K.A.T.E.</h2>
      <div id="{{GAME_CONTAINER}}">{{GAME}}</div>
      <p><button type="button" id="start-game">Start a game</button></p>
    </section>

    <div class="status" id="status"></div>

    <section class="tricks">{{TRICKS}}
    </section>
  </main>

  <script src="/static/skrate.js"></script>
</body>
</html>
"#;
