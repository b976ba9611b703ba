use chrono::NaiveTime;
use std::fmt::Write;

use crate::{
    llm::{ChatMessage, Role},
    model::AllWeather,
};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an assistant giving weather-sensitive advice.
ALWAYS respond in the same language as the user's question.
Personalize your recommendations based on the weather data provided by the agent.
Be mindful of the current time. For example, if it's evening, the recommendations should be for the evening and night, not for the maximum temperature of the day.
Key guidelines:
- If temperature > 30°C: It's hot. Advise light clothing and hydration.
- If temperature < 16°C: It's cool. Advise warm clothing.
- If rain is likely: Advise taking an umbrella.
- Always provide practical, actionable advice.
- Use appropriate emojis to make the response friendly.";

/// Start of the weather block inside an augmented user message.
pub const CONTEXT_HEADER: &str = "\n\n[Current weather data from ";

/// The user's own words, with any appended weather block removed.
pub fn user_text(content: &str) -> &str {
    content
        .find(CONTEXT_HEADER)
        .map_or(content, |at| &content[..at])
}

/// Weather block appended to the user's message.
///
/// Order is fixed: time, temperature, humidity, conditions, then today's and
/// tomorrow's high/low when `include_forecast` is set.
pub fn weather_context(weather: &AllWeather, include_forecast: bool, now: NaiveTime) -> String {
    let current = &weather.current;
    let mut context = format!("{CONTEXT_HEADER}{}]:\n", weather.station_id);

    let _ = write!(
        context,
        "Ora attuale: {}, Temperatura: {}°C, Umidità: {}%, Condizioni: {}",
        now.format("%H:%M"),
        current.temperature_c,
        current.humidity,
        current.description,
    );

    if include_forecast {
        let forecast = &weather.forecast;
        let _ = write!(
            context,
            "\nPrevisioni oggi: {}°C/{}°C\nDomani: {}°C/{}°C",
            forecast.today.high_c, forecast.today.low_c, forecast.tomorrow.high_c, forecast.tomorrow.low_c,
        );
    }

    context
}

/// The two-message conversation sent to the model: system, then user.
pub fn build_messages(
    system_prompt: &str,
    user_message: &str,
    weather: &AllWeather,
    include_forecast: bool,
    now: NaiveTime,
) -> Vec<ChatMessage> {
    let mut content = String::with_capacity(user_message.len() + 160);
    content.push_str(user_message);
    content.push_str(&weather_context(weather, include_forecast, now));

    vec![
        ChatMessage::new(Role::System, system_prompt),
        ChatMessage::new(Role::User, content),
    ]
}
