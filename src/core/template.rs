use minijinja::{context, Environment};

use crate::core::document::PlanningDocument;

/// Renders `document` with `template`. The `.html` template name turns on
/// HTML auto-escaping of event text.
pub fn generate(template: &str, document: &PlanningDocument) -> anyhow::Result<String> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);

    env.add_template("planning.html", template)?;
    let tmpl = env.get_template("planning.html")?;

    let rendered = tmpl.render(context! {
        title => &document.title,
        table => &document.table,
        lessons => &document.lessons,
    })?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::LessonHeading;

    #[test]
    fn test_custom_template_escapes_event_text() -> anyhow::Result<()> {
        let document = PlanningDocument {
            title: "2019 - Term 3 - Week 01 - Maths".to_string(),
            table: vec![],
            lessons: vec![LessonHeading {
                heading: "Monday 22 July - Q&A <1> - L1".to_string(),
            }],
        };

        let rendered = generate(
            "{{ title }}\n{% for lesson in lessons %}\n* {{ lesson.heading }}\n{% endfor %}\n",
            &document,
        )?;

        assert_eq!(
            rendered,
            "2019 - Term 3 - Week 01 - Maths\n* Monday 22 July - Q&amp;A &lt;1&gt; - L1\n"
        );
        Ok(())
    }
}
