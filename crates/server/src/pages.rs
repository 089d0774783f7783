use shared::domain::Game;

/// Minimal HTML escaping for text interpolated into the pages. Usernames
/// and game names come from user input or the remote service.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
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

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         </head>\n\
         <body>\n{body}\n</body>\n\
         </html>\n"
    )
}

pub fn form_page(
    username: &str,
    player_count: Option<u32>,
    playing_time: Option<u32>,
    error: Option<&str>,
) -> String {
    let error_block = match error {
        Some(message) => format!("<p class=\"error\">{}</p>\n", escape(message)),
        None => String::new(),
    };
    let player_count = player_count.map(|v| v.to_string()).unwrap_or_default();
    let playing_time = playing_time.map(|v| v.to_string()).unwrap_or_default();
    let body = format!(
        "<h1>Random Boardgame Picker</h1>\n\
         {error_block}\
         <form method=\"post\" action=\"/\">\n\
         <label>Username\n\
         <input type=\"text\" name=\"username\" value=\"{}\" required>\n\
         </label>\n\
         <label>Minimum Player Count (Optional)\n\
         <input type=\"number\" name=\"player_count\" value=\"{player_count}\" min=\"1\">\n\
         </label>\n\
         <label>Maximum Playing Time in Minutes (Optional)\n\
         <input type=\"number\" name=\"playing_time\" value=\"{playing_time}\" min=\"1\">\n\
         </label>\n\
         <button type=\"submit\">Submit</button>\n\
         </form>",
        escape(username)
    );
    layout("Random Boardgame Picker", &body)
}

pub fn result_page(game: &Game) -> String {
    let image_block = match &game.image {
        Some(url) => format!(
            "<img src=\"{}\" alt=\"{}\">\n",
            escape(url),
            escape(&game.name)
        ),
        None => String::new(),
    };
    let players = match (game.min_players, game.max_players) {
        (Some(min), Some(max)) if min == max => format!("{min} players"),
        (Some(min), Some(max)) => format!("{min}&ndash;{max} players"),
        _ => "player count unknown".to_string(),
    };
    let time = match game.playing_time {
        Some(minutes) => format!("{minutes} minutes"),
        None => "playing time unknown".to_string(),
    };
    let body = format!(
        "<h1>{}</h1>\n\
         {image_block}\
         <p>{players}</p>\n\
         <p>{time}</p>\n\
         <p><a href=\"/\">Pick again</a></p>",
        escape(&game.name)
    );
    layout("Your Game Tonight", &body)
}

pub fn no_match_page(message: &str) -> String {
    let body = format!(
        "<h1>No game found</h1>\n\
         <p>{}</p>\n\
         <p><a href=\"/\">Try different filters</a></p>",
        escape(message)
    );
    layout("No game found", &body)
}

pub fn error_page(message: &str) -> String {
    let body = format!(
        "<h1>Something went wrong</h1>\n\
         <p>{}</p>\n\
         <p><a href=\"/\">Back to the form</a></p>",
        escape(message)
    );
    layout("Something went wrong", &body)
}
