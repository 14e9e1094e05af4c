use anyhow::{Result, anyhow};
use ego_tree::iter::Children;
use scraper::ElementRef;
use scraper::node::Node;

use crate::dom::{find_descendant, has_tag_and_class};
use crate::text::extract_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Ancestor names joined by `.`, e.g. `amount.value`.
    pub name: String,
    pub description: String,
}

/// Depth-first walk over the `div.parameter` blocks directly inside `container`
/// and, recursively, inside each block's `div.parameter__children`.
pub fn parameters(container: ElementRef<'_>) -> Parameters<'_> {
    Parameters {
        stack: vec![Frame {
            prefix: None,
            children: container.children(),
        }],
    }
}

struct Frame<'a> {
    prefix: Option<String>,
    children: Children<'a, Node>,
}

pub struct Parameters<'a> {
    stack: Vec<Frame<'a>>,
}

impl Iterator for Parameters<'_> {
    type Item = Result<Parameter>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some(node) = frame.children.next() else {
                self.stack.pop();
                continue;
            };
            let Some(block) = ElementRef::wrap(node) else {
                continue;
            };
            if !has_tag_and_class(block, "div", "parameter") {
                continue;
            }

            let prefix = frame.prefix.clone();
            return match read_parameter(block) {
                Ok((name, description)) => {
                    let name = match prefix {
                        Some(prefix) => format!("{prefix}.{name}"),
                        None => name,
                    };
                    if let Some(children) = find_descendant(block, |el| {
                        has_tag_and_class(el, "div", "parameter__children")
                    }) {
                        self.stack.push(Frame {
                            prefix: Some(name.clone()),
                            children: children.children(),
                        });
                    }
                    Some(Ok(Parameter { name, description }))
                }
                Err(error) => {
                    self.stack.clear();
                    Some(Err(error))
                }
            };
        }
    }
}

fn read_parameter(block: ElementRef<'_>) -> Result<(String, String)> {
    let name_block = find_descendant(block, |el| has_tag_and_class(el, "div", "parameter__name"))
        .ok_or_else(|| anyhow!("parameter block has no div.parameter__name"))?;
    let code = find_descendant(name_block, |el| el.value().name() == "code")
        .ok_or_else(|| anyhow!("parameter name block has no code element"))?;
    let name = extract_text(Some(code))?;
    let description = extract_text(find_descendant(block, |el| {
        has_tag_and_class(el, "div", "parameter__description")
    }))?;
    Ok((name, description))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use scraper::Html;

    use super::{Parameter, parameters};
    use crate::dom::{find_descendant, has_tag_and_class};

    fn parameter_html(name: &str, description: &str, children: &str) -> String {
        let children = if children.is_empty() {
            String::new()
        } else {
            format!(
                "<p class=\"parameter__children-button\">Show child parameters</p>\n<div class=\"parameter__children\">{children}</div>"
            )
        };
        format!(
            "<div class=\"parameter\">\n<div class=\"parameter__name\"><code>{name}</code> <span class=\"parameter__type\">string</span></div>\n<div class=\"parameter__description\">\n<p>{description}</p>\n{children}\n</div>\n</div>"
        )
    }

    fn collect(html: &str) -> Result<Vec<Parameter>> {
        let document = Html::parse_fragment(html);
        let section = find_descendant(document.root_element(), |el| {
            has_tag_and_class(el, "div", "section")
        })
        .expect("section fixture");
        parameters(section).collect()
    }

    #[test]
    fn nested_parameters_get_dotted_names_in_depth_first_order() {
        let city = parameter_html("city", "The city.", "");
        let zip = parameter_html("postalCode", "The postal code.", "");
        let address = parameter_html("address", "The address.", &format!("{city}{zip}"));
        let method = parameter_html("method", "The method.", "");
        let html = format!("<div class=\"section\"><p>Intro</p>{address}{method}</div>");

        let names = collect(&html)
            .expect("parameters")
            .into_iter()
            .map(|parameter| parameter.name)
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["address", "address.city", "address.postalCode", "method"]
        );
    }

    #[test]
    fn three_levels_produce_two_dots() {
        let c = parameter_html("c", "Deepest.", "");
        let b = parameter_html("b", "Middle.", &c);
        let a = parameter_html("a", "Top.", &b);
        let found = collect(&format!("<div class=\"section\">{a}</div>")).expect("parameters");
        let deepest = found.last().expect("deepest");
        assert_eq!(deepest.name, "a.b.c");
        assert_eq!(deepest.description, "Deepest.");
    }

    #[test]
    fn description_excludes_children_and_toggle() {
        let child = parameter_html("value", "The value.", "");
        let amount = parameter_html("amount", "The amount object.", &child);
        let found = collect(&format!("<div class=\"section\">{amount}</div>")).expect("parameters");
        assert_eq!(
            found[0],
            Parameter {
                name: "amount".to_string(),
                description: "The amount object.".to_string(),
            }
        );
    }

    #[test]
    fn only_direct_children_of_the_section_are_roots() {
        let nested = parameter_html("hidden", "Inside a wrapper.", "");
        let html = format!("<div class=\"section\"><div class=\"wrapper\">{nested}</div></div>");
        assert!(collect(&html).expect("parameters").is_empty());
    }

    #[test]
    fn parameter_without_name_block_is_an_error() {
        let html = r#"<div class="section"><div class="parameter"><div class="parameter__description">Orphan.</div></div></div>"#;
        let error = collect(html).expect_err("must fail");
        assert!(error.to_string().contains("parameter__name"));
    }

    #[test]
    fn missing_description_yields_empty_text() {
        let html = r#"<div class="section"><div class="parameter"><div class="parameter__name"><code>id</code></div></div></div>"#;
        let found = collect(html).expect("parameters");
        assert_eq!(found[0].name, "id");
        assert_eq!(found[0].description, "");
    }
}
