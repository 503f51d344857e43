//! LLM prompt for receipt extraction.
//!
//! One structured prompt per request: the user text, an optional
//! snapshot of the previous incomplete draft (multi-turn
//! continuation), and worked examples covering currency synonyms,
//! mixed payments and the name-before-price rule.

use crate::types::ReceiptDraft;

/// System/task prompt. The model must answer with a single JSON
/// object and nothing else; the scanner tolerates surrounding prose
/// anyway.
pub const EXTRACT_PROMPT: &str = r#"Ты разбираешь текст кассира в структуру чека.

Верни ОДИН JSON-объект без пояснений:
{
    "items": [{"name": "название", "price": 200, "quantity": 1}],
    "payments": [{"type": "cash" | "card" | "advance" | "credit" | "other", "amount": 200}],
    "email": "адрес или null",
    "phone": "телефон или null",
    "error": "missing_price, если цену определить нельзя"
}

Правила:
1. Название товара — всё, что стоит ПЕРЕД ценой. "латте с корицей 250р" -> name: "латте с корицей", price: 250.
2. Синонимы цены: "руб", "рублей", "р", "₽", "по 200", "за 300".
3. "два кофе по 150" -> quantity: 2, price: 150.
4. Смешанная оплата: "500 наличными, остальное картой" -> два элемента payments.
5. Если оплата не указана — payments не заполняй.
6. Если цены нет и её нельзя вывести — верни error: "missing_price".
7. Не выдумывай email и телефон, бери только из текста.

Примеры:

Текст: "кофе 200 рублей, почта ivan@mail.ru"
Ответ: {"items": [{"name": "кофе", "price": 200, "quantity": 1}], "payments": [], "email": "ivan@mail.ru", "phone": null, "error": null}

Текст: "две пиццы по 450 и кола 90, 500 наличными остальное картой"
Ответ: {"items": [{"name": "пицца", "price": 450, "quantity": 2}, {"name": "кола", "price": 90, "quantity": 1}], "payments": [{"type": "cash", "amount": 500}, {"type": "card", "amount": 490}], "email": null, "phone": null, "error": null}

Текст: "консультация юриста без почты"
Ответ: {"items": [{"name": "консультация юриста", "price": 0, "quantity": 1}], "payments": [], "email": null, "phone": null, "error": "missing_price"}
"#;

/// Assemble the full prompt for one request.
pub fn build_extract_prompt(text: &str, previous: Option<&ReceiptDraft>) -> String {
    let mut prompt = String::from(EXTRACT_PROMPT);
    if let Some(draft) = previous {
        // Compact snapshot so the model continues the draft instead
        // of starting over.
        if let Ok(snapshot) = serde_json::to_string(draft) {
            prompt.push_str("\nНезавершённый чек из прошлого сообщения (дополни его):\n");
            prompt.push_str(&snapshot);
            prompt.push('\n');
        }
    }
    prompt.push_str("\nТекст: \"");
    prompt.push_str(text);
    prompt.push_str("\"\nОтвет:");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_user_text() {
        let prompt = build_extract_prompt("кофе 200", None);
        assert!(prompt.contains("кофе 200"));
        assert!(prompt.contains("missing_price"));
    }

    #[test]
    fn prompt_embeds_previous_draft() {
        let draft = ReceiptDraft::default();
        let prompt = build_extract_prompt("почта a@b.ru", Some(&draft));
        assert!(prompt.contains("Незавершённый чек"));
    }
}
