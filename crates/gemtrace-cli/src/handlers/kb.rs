use crate::context::ExecutionContext;
use crate::types::KbCategory;
use anyhow::Result;

/// Print the active tables, one category or all of them. Overlay entries
/// are already merged in, so the listing shows what resolution will use.
pub fn list(ctx: &ExecutionContext, category: Option<KbCategory>) -> Result<()> {
    let kb = ctx.kb()?;
    let selected: Vec<KbCategory> = match category {
        Some(one) => vec![one],
        None => KbCategory::ALL.to_vec(),
    };

    for (position, category) in selected.iter().enumerate() {
        if position > 0 {
            println!();
        }
        let entries = kb.entries((*category).into());
        println!("{} ({} entries)", category, entries.len());
        for (code, meaning) in entries {
            println!("  {:<12} {}", code, meaning);
        }
    }

    Ok(())
}

pub fn resolve(ctx: &ExecutionContext, category: KbCategory, code: &str) -> Result<()> {
    let kb = ctx.kb()?;
    println!("{}", kb.resolve(category.into(), code));
    Ok(())
}
