use dominator::{svg, Dom};

fn outline(class: &str, d: &str) -> Dom {
    svg!("svg", {
        .attr("xmlns", "http://www.w3.org/2000/svg")
        .attr("fill", "none")
        .attr("viewBox", "0 0 24 24")
        .attr("stroke", "currentColor")
        .class(class)
        .children(&mut [
            svg!("path", {
                .attr("stroke-linecap", "round")
                .attr("stroke-linejoin", "round")
                .attr("stroke-width", "1.5")
                .attr("d", d)
            })
        ])
    })
}

pub fn chevron_left() -> Dom {
    outline("icon", "M15 19l-7-7 7-7")
}

pub fn chevron_right() -> Dom {
    outline("icon", "M9 5l7 7-7 7")
}

pub fn arrow_up() -> Dom {
    outline("icon-sm", "M5 15l7-7 7 7")
}

pub fn arrow_down() -> Dom {
    outline("icon-sm", "M19 9l-7 7-7-7")
}

pub fn refresh() -> Dom {
    outline("icon", "M4 4v5h.582m15.356 2A8.001 8.001 0 004.582 9m0 0H9m11 11v-5h-.581m0 0a8.003 8.003 0 01-15.357-2m15.357 2H15")
}

pub fn search() -> Dom {
    outline("icon", "M21 21l-6-6m2-5a7 7 0 11-14 0 7 7 0 0114 0z")
}

pub fn filter() -> Dom {
    outline("icon", "M3 4a1 1 0 011-1h16a1 1 0 011 1v2.586a1 1 0 01-.293.707l-6.414 6.414a1 1 0 00-.293.707V17l-4 4v-6.586a1 1 0 00-.293-.707L3.293 7.293A1 1 0 013 6.586V4z")
}

pub fn download() -> Dom {
    outline("icon", "M4 16v1a3 3 0 003 3h10a3 3 0 003-3v-1m-4-4l-4 4m0 0l-4-4m4 4V4")
}

pub fn trash() -> Dom {
    outline("icon-sm", "M19 7l-.867 12.142A2 2 0 0116.138 21H7.862a2 2 0 01-1.995-1.858L5 7m5 4v6m4-6v6m1-10V4a1 1 0 00-1-1h-4a1 1 0 00-1 1v3M4 7h16")
}

pub fn play() -> Dom {
    outline("icon", "M14.752 11.168l-3.197-2.132A1 1 0 0010 9.87v4.263a1 1 0 001.555.832l3.197-2.132a1 1 0 000-1.664z")
}

pub fn pause() -> Dom {
    outline("icon", "M10 9v6m4-6v6")
}

pub fn settings() -> Dom {
    outline("icon", "M12 6V4m0 2a2 2 0 100 4m0-4a2 2 0 110 4m-6 8a2 2 0 100-4m0 4a2 2 0 110-4m0 4v2m0-6V4m6 6v10m6-2a2 2 0 100-4m0 4a2 2 0 110-4m0 4v2m0-6V4")
}

pub fn heart() -> Dom {
    outline("icon", "M4.318 6.318a4.5 4.5 0 000 6.364L12 20.364l7.682-7.682a4.5 4.5 0 00-6.364-6.364L12 7.636l-1.318-1.318a4.5 4.5 0 00-6.364 0z")
}

pub fn checkmark() -> Dom {
    outline("icon-sm", "M5 13l4 4L19 7")
}

pub fn x_mark() -> Dom {
    outline("icon-sm", "M6 18L18 6M6 6l12 12")
}

pub fn select_all() -> Dom {
    outline("icon", "M9 5H7a2 2 0 00-2 2v12a2 2 0 002 2h10a2 2 0 002-2V7a2 2 0 00-2-2h-2M9 5a2 2 0 002 2h2a2 2 0 002-2M9 5a2 2 0 012-2h2a2 2 0 012 2m-6 9l2 2 4-4")
}

