use crate::config::DescriptionExample;

const DESCRIPTION_INSTRUCTIONS: &str = "Generate a suitable description in Russian language for a social media group, \
where I am going to post short videos. Base your answer on 1) the topic of the group that needs a description and \
2) the examples that pair a topic with a description. Do not copy the examples closely: add variety so every \
description looks unique, keeping in mind that many groups are created and several share a topic. \
Each description must still suit a social media group. Paragraph indentation is allowed where it makes sense, \
but not in every description.";

/// Build the description prompt for `topic`, embedding the sample pairs.
pub fn description_prompt(topic: &str, examples: &[DescriptionExample]) -> String {
    let mut prompt = format!(
        "{}\nTopic of the group that needs a description is {}.",
        DESCRIPTION_INSTRUCTIONS, topic
    );

    if !examples.is_empty() {
        prompt.push_str(" Here are the examples you can use:\n\n");
        let listed = examples
            .iter()
            .enumerate()
            .map(|(i, example)| {
                format!(
                    "Topic of group {} is {}. Description is {}\n",
                    i + 1,
                    example.topic,
                    example.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        prompt.push_str(&listed);
    }

    prompt
}

/// Build the profile picture prompt for `topic`.
pub fn image_prompt(topic: &str) -> String {
    format!(
        "Generate a profile picture for a social media group with topic: {}. \
         The style should suit a social media group, modern and good looking. \
         The picture must be pleasant to look at, must not include any text and should not look overly AI-generated.",
        topic
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_prompt_lists_examples_in_order() {
        let examples = vec![
            DescriptionExample {
                topic: "cooking".to_string(),
                description: "Recipes".to_string(),
            },
            DescriptionExample {
                topic: "travel".to_string(),
                description: "Trips".to_string(),
            },
        ];
        let prompt = description_prompt("pets", &examples);
        assert!(prompt.contains("Topic of the group that needs a description is pets."));
        let first = prompt.find("Topic of group 1 is cooking").unwrap();
        let second = prompt.find("Topic of group 2 is travel").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_description_prompt_without_examples() {
        let prompt = description_prompt("pets", &[]);
        assert!(!prompt.contains("Here are the examples"));
    }

    #[test]
    fn test_image_prompt_mentions_topic() {
        assert!(image_prompt("mountains").contains("topic: mountains"));
    }
}
