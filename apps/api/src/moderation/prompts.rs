// Prompt constants for the Moderation module.
// Bump MODERATION_TEMPLATE_VERSION whenever the template or the precedent line
// format changes; the tests below pin the sections the parser depends on.

pub const MODERATION_TEMPLATE_VERSION: &str = "v4";

pub const MODERATION_SYSTEM: &str = "You are a content moderation assistant responsible for \
    reviewing text content to ensure they are not against community policies.";

/// The reply closes the record it was seeded with.
pub const MODERATION_STOP: &str = "</moderation>";

/// Assistant prefill. Replace `{content}` before sending.
pub const MODERATION_PREFILL_TEMPLATE: &str =
    "<moderation><content>{content}</content><explanation>";

/// Replace `{whitelist_examples}`, `{blacklist_examples}` and `{content}` before sending.
pub const MODERATION_PROMPT_TEMPLATE: &str = r#"Here is the policies of moderation:

<policies>
# Account Trade:
Low: Asking for account services, mentioning account trade experiences, promoting account giveaways/exchanges.
Middle: Providing account trading or account services for currency.

# Scams & Advertisements:
Middle: Promoting phishing websites, free in-game currency, hack services, refund services, or advertisements with purchase links/contact info.

# Information Leakage:
Low: Mentioning information leakage events, blacklisted websites.
Middle: Discussing or sharing leaked information.

# Verbal Abuse & Threats:
Low: Offensive speech, personal attacks, hate speech towards subjects.
Middle: Personal attacks, hate speech, threats towards individuals/groups.
Note that additionally:
1. You are moderating a game community, so some combat, weapon and game-related terms should be tolerated.
2. For expressing strong negative sentiment about the game or the game experience, like dissatisfaction, anger, and frustration, the use of violent/insult/vulgar words should be tolerated.
3. Some common national swear words, such as 'fucking' or 'damn', should be tolerated.

# Sensitivity & Nudity:
Low: Mentioning private parts, sexual activities, asking for sexual services, insult words or discrimination to LGBT people.
Middle: Providing or promoting sexual services and websites.
High: Any discrimination against LGBT people.
Note that additionally:
1. Implicit, suggestive or ambiguous sexual contents should be tolerated.

# Minor Safety:
Low: Grooming behavior, normalizing pedophilia, admitting romantic relationships with minors.
Middle: Sexual content involving minors.
High: Providing sexual services involving minors, revealing account owner is under 13.

# Illegal Activities:
Low: Simply mentioning illegal goods/activities, temptation of committing crimes, fake news, conspiracy theories.
High: Actually promoting illegal goods/activities, glorifying illegal activities.

# Religious and Political Content:
High: Discussing REAL WORLD (NOT IN GAME) war conflicts, territorial disputes, military installations, diplomatic relationships, political events, entities, desecrating symbols, persuading beliefs, political statements, support/opposition, controversial flags/slogans.

# Personal Identifiable Information:
Low: Depicting personal information like phone numbers, addresses, IDs, bank accounts.

# Violent Extremism:
Low: Mentioning extremisms, hate ideologies like terrorism, white supremacy, Nazism.
High: Promoting extremisms, hate ideologies.

# Suicide & Self-Harm:
Low: Texts depicting trustworthy suicidal tendency.
High: Texts mentioning or promoting suicide challenges.
</policies>

Here are some examples to help you understand the policies:

<examples>
<Whitelist>
{whitelist_examples}
</Whitelist>

<Blacklist>
{blacklist_examples}
</Blacklist>
</examples>

To complete your task, please follow these steps:

1. Review the given text input carefully.
2. Categorize and rate the text content (low/medium/high) based on the provided policy rules.
3. If the content is appropriate, mark the Result as "pass".
4. If the content is ambiguous, or you are unsure, mark the Result as "review".
5. If the risk level of the content is low, and recognized as mild which could be tolerated in the policies, mark the Result as "review".
6. If the content is explicitly high risk, mark the Result as "reject" and specify the violated Category.
7. Please follow the output format in <examples>, give the explanation first and then output the result, category and confidence (score range: 1-5).

Below is the content which is pending review.
<content>{content}</content>"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn position(needle: &str) -> usize {
        MODERATION_PROMPT_TEMPLATE
            .find(needle)
            .unwrap_or_else(|| panic!("template is missing {needle}"))
    }

    #[test]
    fn test_sections_appear_in_order() {
        let order = [
            "<policies>",
            "</policies>",
            "<examples>",
            "<Whitelist>",
            "{whitelist_examples}",
            "</Whitelist>",
            "<Blacklist>",
            "{blacklist_examples}",
            "</Blacklist>",
            "</examples>",
            "<content>{content}</content>",
        ];
        let positions: Vec<usize> = order.iter().map(|s| position(s)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn test_each_placeholder_appears_once() {
        for placeholder in ["{whitelist_examples}", "{blacklist_examples}", "{content}"] {
            assert_eq!(MODERATION_PROMPT_TEMPLATE.matches(placeholder).count(), 1);
        }
    }

    #[test]
    fn test_prefill_is_closed_by_stop_sequence() {
        assert!(MODERATION_PREFILL_TEMPLATE.starts_with("<moderation>"));
        assert_eq!(MODERATION_STOP, "</moderation>");
    }
}
