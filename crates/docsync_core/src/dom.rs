use scraper::ElementRef;

pub fn has_tag_and_class(element: ElementRef<'_>, tag: &str, class: &str) -> bool {
    let value = element.value();
    value.name() == tag && value.classes().any(|name| name == class)
}

/// Matches `h0` through `h9`.
pub fn is_heading(element: ElementRef<'_>) -> bool {
    let mut chars = element.value().name().chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some('h'), Some(digit), None) if digit.is_ascii_digit()
    )
}

pub fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

pub fn find_child<'a>(
    element: ElementRef<'a>,
    predicate: impl Fn(ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
    child_elements(element).find(|child| predicate(*child))
}

/// First matching element below `element` in document order, excluding itself.
pub fn find_descendant<'a>(
    element: ElementRef<'a>,
    predicate: impl Fn(ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|candidate| predicate(*candidate))
}

pub fn find_descendants<'a>(
    element: ElementRef<'a>,
    predicate: impl Fn(ElementRef<'a>) -> bool,
) -> impl Iterator<Item = ElementRef<'a>> {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |candidate| predicate(*candidate))
}
