//! Handlebars helpers exposing the naming conventions to templates

use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderErrorReason};

use crate::naming;

pub fn register(handlebars: &mut Handlebars<'static>) {
    handlebars.register_helper("lower", Box::new(lower_helper));
    handlebars.register_helper("upper", Box::new(upper_helper));
    handlebars.register_helper("title", Box::new(title_helper));
    handlebars.register_helper("plural", Box::new(plural_helper));
    handlebars.register_helper("varName", Box::new(var_name_helper));
    handlebars.register_helper("urlName", Box::new(url_name_helper));
    handlebars.register_helper("shortVarName", Box::new(short_var_name_helper));
    handlebars.register_helper("json", Box::new(json_helper));
}

fn first_str<'a>(h: &'a Helper) -> &'a str {
    h.param(0).and_then(|v| v.value().as_str()).unwrap_or("")
}

fn lower_helper(h: &Helper, _: &Handlebars, _: &Context, _: &mut RenderContext, out: &mut dyn Output) -> HelperResult {
    out.write(&first_str(h).to_lowercase())?;
    Ok(())
}

fn upper_helper(h: &Helper, _: &Handlebars, _: &Context, _: &mut RenderContext, out: &mut dyn Output) -> HelperResult {
    out.write(&first_str(h).to_uppercase())?;
    Ok(())
}

fn title_helper(h: &Helper, _: &Handlebars, _: &Context, _: &mut RenderContext, out: &mut dyn Output) -> HelperResult {
    out.write(&naming::upper_first(first_str(h)))?;
    Ok(())
}

fn plural_helper(h: &Helper, _: &Handlebars, _: &Context, _: &mut RenderContext, out: &mut dyn Output) -> HelperResult {
    out.write(&naming::make_plural(first_str(h)))?;
    Ok(())
}

fn var_name_helper(h: &Helper, _: &Handlebars, _: &Context, _: &mut RenderContext, out: &mut dyn Output) -> HelperResult {
    out.write(&naming::var_name(first_str(h)))?;
    Ok(())
}

fn url_name_helper(h: &Helper, _: &Handlebars, _: &Context, _: &mut RenderContext, out: &mut dyn Output) -> HelperResult {
    out.write(&naming::url_name(first_str(h)))?;
    Ok(())
}

fn short_var_name_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&naming::short_var_name(first_str(h)))?;
    Ok(())
}

fn json_helper(h: &Helper, _: &Handlebars, _: &Context, _: &mut RenderContext, out: &mut dyn Output) -> HelperResult {
    if let Some(v) = h.param(0) {
        let json = serde_json::to_string(v.value())
            .map_err(|e| RenderErrorReason::Other(format!("json helper: {e}")))?;
        out.write(&json)?;
    }
    Ok(())
}
